/// Boot sectors are always 1 through 3
pub const BOOT_SECTORS: u32 = 3;
/// Length of the boot sectors regardless of density
pub const BOOT_SECTOR_LEN: usize = 128;
/// Primary VTOC sector, also the anchor for MyDOS multi-VTOC layouts
pub const VTOC_SECTOR: u32 = 360;
/// First sector of the root directory
pub const DIR_SECTOR: u32 = 361;
/// Every directory spans this many contiguous sectors
pub const DIR_SECTORS: u32 = 8;
/// DOS 2.5 secondary VTOC, used only on enhanced density
pub const VTOC2_SECTOR: u32 = 1024;
/// Sector count of an enhanced density disk
pub const ED_SECTORS: u32 = 1040;
/// Enhanced density split, the primary VTOC maps sectors up to and including this
pub const ED_SPLIT: u32 = 720;
/// First sector mapped by the secondary VTOC bitmap
pub const VTOC2_BASE: u32 = 48;
/// Offset of the free count within the secondary VTOC
pub const VTOC2_FREE_OFFSET: usize = 122;
/// Offset of the bitmap within the primary VTOC
pub const VTOC_BITMAP_OFFSET: usize = 10;
/// Highest sector a 10-bit link can address
pub const MAX_10BIT_SECTOR: u32 = 1023;
pub const MAX_SECTORS: u32 = 65535;
pub const MIN_SECTORS: u32 = 720;
/// Size of a directory entry in bytes, always 16
pub const ENTRY_SIZE: usize = 16;
/// Entries per directory sector as written by DOS 2 and MyDOS
pub const ENTRIES_PER_SECTOR: usize = 8;
/// Entries per directory sector on MyDOS big images
pub const BIG_ENTRIES_PER_SECTOR: usize = 16;
/// Maximum number of entries in one directory level
pub const MAX_ENTRIES: usize = 64;
/// Offset in the first directory sector that reveals a big directory
pub const BIG_DIR_SENTINEL: usize = 0x80;
/// Host files longer than this are truncated
pub const MAX_FILE_LEN: usize = 0xffff * 253;
/// Name of the long name mapping file
pub const PICONAME: &str = "PICONAME.TXT";
/// ATASCII end of line
pub const EOL: u8 = 0x9b;

/// Status bits of a directory entry
pub mod status {
    pub const OPEN_OUTPUT: u8 = 0x01;
    pub const DOS2: u8 = 0x02;
    /// MyDOS file with 16-bit links, no file numbers in the sector trailer
    pub const LINK16: u8 = 0x04;
    pub const SUBDIR: u8 = 0x10;
    pub const LOCKED: u8 = 0x20;
    pub const IN_USE: u8 = 0x40;
    pub const DELETED: u8 = 0x80;
    /// closed regular file
    pub const CLOSED: u8 = IN_USE | DOS2;
    /// file being written
    pub const OPENING: u8 = IN_USE | DOS2 | OPEN_OUTPUT;
    /// DOS 2.5 closed file that uses sectors above 719
    pub const CLOSED_ED: u8 = DOS2 | OPEN_OUTPUT;
}

/// Enumerates DOS errors.  The `Display` trait will print a DOS style message such as `DISK FULL`.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("DISK FULL")]
    DiskFull,
    #[error("DIRECTORY FULL")]
    DirectoryFull,
    #[error("FILE NAME COLLISION")]
    NameCollision,
    #[error("FILE NOT FOUND")]
    FileNotFound,
    #[error("FILE NUMBER MISMATCH")]
    FileNumberMismatch,
    #[error("SECTOR CHAIN LOOP")]
    ChainLoop,
    #[error("SECTOR LINK OUT OF RANGE")]
    LinkRange,
    #[error("BAD BYTE COUNT")]
    ByteCount,
    #[error("BAD DIRECTORY ENTRY")]
    BadEntry,
    #[error("UNSUPPORTED DISK GEOMETRY")]
    Geometry,
    #[error("REQUIRES MYDOS")]
    RequiresMyDos,
    #[error("NO HOST DIRECTORY")]
    NoHostPath,
    #[error("NOT A DOS 2 DISK")]
    NotDos,
    #[error("BOOT IMAGE MISSING")]
    BootImageMissing,
    #[error("INVALID OPTION")]
    InvalidOption
}
