//! ### Name packing
//!
//! Functions to turn host file names into Atari 8.3 names and back.
//! Host names are usually longer and use characters DOS does not accept,
//! so the mapping is lossy; collisions are resolved with a two digit counter.

use log::{debug,warn};
use super::format::DosVariant;
use super::types::{Error,EOL};

const BASE_LEN: usize = 8;
const EXT_LEN: usize = 3;
const DEFAULT_BASE: &[u8] = b"NONAME";

fn legal(c: u8,dos: DosVariant,leading: bool) -> bool {
    match dos {
        DosVariant::Dos2x => c.is_ascii_uppercase() || c.is_ascii_digit(),
        DosVariant::MyDos => c.is_ascii_uppercase() || c==b'_' || (!leading && c.is_ascii_digit())
    }
}

/// keep at most `max` legal characters, uppercased
fn filter(s: &str,dos: DosVariant,max: usize) -> Vec<u8> {
    let mut ans = Vec::new();
    for c in s.bytes().map(|c| c.to_ascii_uppercase()) {
        if ans.len()==max {
            break;
        }
        if legal(c,dos,ans.is_empty()) {
            ans.push(c);
        }
    }
    ans
}

/// Map a host name to a space padded 8.3 name that is not among `existing`.
/// The extension is whatever follows the last dot.  On collision two characters
/// starting at the first space of the base (but no later than position 6) are
/// replaced by a counter 01 through 99.
pub fn build_atari_name(long_name: &str,dos: DosVariant,existing: &[[u8;11]]) -> Result<[u8;11],Error> {
    let (base,ext) = match long_name.rfind('.') {
        Some(i) => (&long_name[0..i],&long_name[i+1..]),
        None => (long_name,"")
    };
    let mut base = filter(base,dos,BASE_LEN);
    if base.is_empty() {
        base = DEFAULT_BASE.to_vec();
    }
    // extension follows the same rules as the base, except digits may lead on MyDOS
    let ext: Vec<u8> = ext.bytes().map(|c| c.to_ascii_uppercase()).filter(|c| legal(*c,dos,false)).take(EXT_LEN).collect();
    let mut ans = [b' ';11];
    ans[0..base.len()].copy_from_slice(&base);
    ans[BASE_LEN..BASE_LEN+ext.len()].copy_from_slice(&ext);
    if !existing.contains(&ans) {
        return Ok(ans);
    }
    let pos = usize::min(base.len(),BASE_LEN - 2);
    for n in 1..100 {
        let digits = format!("{:02}",n);
        ans[pos..pos+2].copy_from_slice(digits.as_bytes());
        if !existing.contains(&ans) {
            debug!("{} collides, using {}",long_name,file_name_to_string(ans));
            return Ok(ans);
        }
    }
    warn!("no unique name could be made for {}",long_name);
    Err(Error::NameCollision)
}

/// Display form of an 8.3 name, `BASE.EXT`, or `BASE` with no extension.
/// Characters outside printable ASCII are escaped.
pub fn file_name_to_string(fname: [u8;11]) -> String {
    let base = crate::escaped_ascii_from_bytes(&fname[0..BASE_LEN].to_vec(),true);
    let ext = crate::escaped_ascii_from_bytes(&fname[BASE_LEN..].to_vec(),true);
    match ext.trim_end() {
        "" => base.trim_end().to_string(),
        e => [base.trim_end(),".",e].concat()
    }
}

/// Parse `BASE.EXT` into a padded 8.3 name without any filtering.
/// Returns `None` if either part is too long.
pub fn string_to_file_name(s: &str) -> Option<[u8;11]> {
    let upper = s.to_uppercase();
    let (base,ext) = match upper.rfind('.') {
        Some(i) => (&upper[0..i],&upper[i+1..]),
        None => (upper.as_str(),"")
    };
    if base.len() > BASE_LEN || ext.len() > EXT_LEN {
        return None;
    }
    let mut ans = [b' ';11];
    ans[0..base.len()].copy_from_slice(base.as_bytes());
    ans[BASE_LEN..BASE_LEN+ext.len()].copy_from_slice(ext.as_bytes());
    Some(ans)
}

/// Contents of PICONAME.TXT: a title line, then one line per entry holding the raw
/// 11 character short name, a space, and the long name.  Lines end with ATASCII EOL.
pub fn piconame_bytes(title: &str,names: &[(String,[u8;11])]) -> Vec<u8> {
    let printable = |s: &str| -> Vec<u8> {
        s.chars().map(|c| match c {
            ' '..='~' => c as u8,
            _ => b'_'
        }).collect()
    };
    let mut ans = printable(title);
    ans.push(EOL);
    for (long,short) in names {
        ans.extend_from_slice(short);
        ans.push(b' ');
        ans.append(&mut printable(long));
        ans.push(EOL);
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_names() {
        assert_eq!(&build_atari_name("hello.txt",DosVariant::Dos2x,&[]).unwrap(),b"HELLO   TXT");
        assert_eq!(&build_atari_name("My File-Name.basic",DosVariant::Dos2x,&[]).unwrap(),b"MYFILENABAS");
        assert_eq!(&build_atari_name("archive.tar.gz",DosVariant::Dos2x,&[]).unwrap(),b"ARCHIVETGZ ");
        assert_eq!(&build_atari_name("README",DosVariant::Dos2x,&[]).unwrap(),b"README     ");
        assert_eq!(&build_atari_name(".profile",DosVariant::Dos2x,&[]).unwrap(),b"NONAME  PRO");
    }

    #[test]
    fn variant_charsets() {
        assert_eq!(&build_atari_name("2cool_4u.com",DosVariant::Dos2x,&[]).unwrap(),b"2COOL4U COM");
        assert_eq!(&build_atari_name("2cool_4u.com",DosVariant::MyDos,&[]).unwrap(),b"COOL_4U COM");
        assert_eq!(&build_atari_name("x.1",DosVariant::MyDos,&[]).unwrap(),b"X       1  ");
    }

    #[test]
    fn collisions() {
        let mut existing = Vec::new();
        for _i in 0..64 {
            let name = build_atari_name("longfilename.dat",DosVariant::Dos2x,&existing).unwrap();
            assert!(!existing.contains(&name));
            existing.push(name);
        }
        assert_eq!(&existing[0],b"LONGFILEDAT");
        assert_eq!(&existing[1],b"LONGFI01DAT");
        let short = build_atari_name("abc",DosVariant::Dos2x,&[*b"ABC        "]).unwrap();
        assert_eq!(&short,b"ABC01      ");
    }

    #[test]
    fn collision_exhaustion() {
        let mut existing = vec![*b"AB         "];
        for n in 1..100 {
            let mut name = *b"AB         ";
            name[2..4].copy_from_slice(format!("{:02}",n).as_bytes());
            existing.push(name);
        }
        assert!(build_atari_name("ab",DosVariant::Dos2x,&existing).is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(file_name_to_string(*b"DOS     SYS"),"DOS.SYS");
        assert_eq!(file_name_to_string(*b"README     "),"README");
        assert_eq!(string_to_file_name("dos.sys"),Some(*b"DOS     SYS"));
        assert_eq!(string_to_file_name("toolongname.sys"),None);
    }

    #[test]
    fn piconame_layout() {
        let names = vec![("Star Raiders.xex".to_string(),*b"STARRAIDXEX")];
        let dat = piconame_bytes("games",&names);
        assert_eq!(&dat[0..6],b"games\x9b");
        assert_eq!(&dat[6..17],b"STARRAIDXEX");
        assert_eq!(dat[17],b' ');
        assert_eq!(dat.len(),6 + 11 + 1 + 16 + 1);
        assert_eq!(dat.last(),Some(&EOL));
    }
}
