use assert_cmd::Command; // Run programs, with stdin
use predicates::prelude::*; // Used for writing assertions
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

#[test]
fn mkdsk_and_catalog() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let dimg_path = dir.path().join("blank.atr");
    Command::cargo_bin("a8kit")?
        .arg("mkdsk").arg("-o").arg("dos2").arg("-k").arg("ed")
        .arg("-d").arg(&dimg_path)
        .assert()
        .success();
    Command::cargo_bin("a8kit")?
        .arg("catalog").arg("-d").arg(&dimg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1010 FREE SECTORS"));
    // refuse to clobber
    Command::cargo_bin("a8kit")?
        .arg("mkdsk").arg("-o").arg("dos2")
        .arg("-d").arg(&dimg_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    Ok(())
}

#[test]
fn mkdsk_bad_geometry() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    Command::cargo_bin("a8kit")?
        .arg("mkdsk").arg("-o").arg("dos2").arg("-k").arg("4096x256")
        .arg("-d").arg(dir.path().join("big.atr"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOS 2.x cannot address"));
    Ok(())
}

#[test]
fn mkatr_get_put() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("HELLO.TXT"),b"HELLO FROM THE HOST")?;
    std::fs::create_dir(src.join("SUB"))?;
    std::fs::write(src.join("SUB").join("INNER.DAT"),vec![1,2,3])?;
    let dimg_path = dir.path().join("built.atr");
    Command::cargo_bin("a8kit")?
        .arg("mkatr").arg("-s").arg(&src).arg("-o").arg("mydos").arg("--piconame").arg("never")
        .arg("-d").arg(&dimg_path)
        .assert()
        .success();
    Command::cargo_bin("a8kit")?
        .arg("get").arg("-f").arg("HELLO.TXT").arg("-d").arg(&dimg_path)
        .assert()
        .success()
        .stdout(b"HELLO FROM THE HOST".as_slice());
    Command::cargo_bin("a8kit")?
        .arg("get").arg("-f").arg("SUB/INNER.DAT").arg("-d").arg(&dimg_path)
        .assert()
        .success()
        .stdout(b"\x01\x02\x03".as_slice());
    Command::cargo_bin("a8kit")?
        .arg("put").arg("-f").arg("SUB/NEW.TXT").arg("-d").arg(&dimg_path)
        .write_stdin("PUT FROM STDIN")
        .assert()
        .success();
    Command::cargo_bin("a8kit")?
        .arg("get").arg("-f").arg("SUB/NEW.TXT").arg("-d").arg(&dimg_path)
        .assert()
        .success()
        .stdout(b"PUT FROM STDIN".as_slice());
    Command::cargo_bin("a8kit")?
        .arg("catalog").arg("-d").arg(&dimg_path).arg("--json").arg("--filter").arg("*.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"HELLO.TXT\""))
        .stdout(predicate::str::contains("SUB").not());
    Command::cargo_bin("a8kit")?
        .arg("catalog").arg("-d").arg(&dimg_path).arg("-f").arg("SUB")
        .assert()
        .success()
        .stdout(predicate::str::contains("  INNER    DAT 001"));
    Ok(())
}

#[test]
fn get_sectors() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let dimg_path = dir.path().join("sd.atr");
    Command::cargo_bin("a8kit")?
        .arg("mkdsk").arg("-d").arg(&dimg_path)
        .assert()
        .success();
    let output = Command::cargo_bin("a8kit")?
        .arg("get").arg("-t").arg("sec").arg("-f").arg("360").arg("-d").arg(&dimg_path)
        .output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout.len(),128);
    assert_eq!(output.stdout[0..5],[2,0xc3,0x02,0xc3,0x02]);
    Command::cargo_bin("a8kit")?
        .arg("get").arg("-t").arg("sec").arg("-f").arg("721").arg("-d").arg(&dimg_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn sector_put_mirrors_directory() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("HELLO.TXT"),b"HI")?;
    let dimg_path = dir.path().join("sd.atr");
    Command::cargo_bin("a8kit")?
        .arg("mkatr").arg("-s").arg(&src).arg("-k").arg("sd").arg("-d").arg(&dimg_path)
        .assert()
        .success();
    let output = Command::cargo_bin("a8kit")?
        .arg("get").arg("-t").arg("sec").arg("-f").arg("361").arg("-d").arg(&dimg_path)
        .output()?;
    let mut dir_sector = output.stdout.clone();
    dir_sector[5..16].copy_from_slice(b"BYE     TXT");
    Command::cargo_bin("a8kit")?
        .arg("put").arg("-t").arg("sec").arg("-f").arg("361").arg("-d").arg(&dimg_path)
        .arg("--mirror").arg(&src)
        .write_stdin(dir_sector)
        .assert()
        .success();
    assert!(!src.join("HELLO.TXT").exists());
    assert_eq!(std::fs::read(src.join("BYE.TXT"))?,b"HI");
    Ok(())
}

#[test]
fn sector_put_survives_mirror_failure() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("HELLO.TXT"),b"HI")?;
    let dimg_path = dir.path().join("sd.atr");
    Command::cargo_bin("a8kit")?
        .arg("mkatr").arg("-s").arg(&src).arg("-k").arg("sd").arg("-d").arg(&dimg_path)
        .assert()
        .success();
    let output = Command::cargo_bin("a8kit")?
        .arg("get").arg("-t").arg("sec").arg("-f").arg("361").arg("-d").arg(&dimg_path)
        .output()?;
    let mut dir_sector = output.stdout.clone();
    dir_sector[5..16].copy_from_slice(b"BYE     TXT");
    // the host side has nothing to rename
    Command::cargo_bin("a8kit")?
        .arg("put").arg("-t").arg("sec").arg("-f").arg("361").arg("-d").arg(&dimg_path)
        .arg("--mirror").arg(dir.path().join("missing"))
        .write_stdin(dir_sector.clone())
        .assert()
        .failure()
        .stderr(predicate::str::contains("host mirror failed"));
    let output = Command::cargo_bin("a8kit")?
        .arg("get").arg("-t").arg("sec").arg("-f").arg("361").arg("-d").arg(&dimg_path)
        .output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout,dir_sector);
    Ok(())
}

#[test]
fn estimate_directory() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("A.BIN"),vec![0;200000])?;
    Command::cargo_bin("a8kit")?
        .arg("estimate").arg("-s").arg(dir.path()).arg("-o").arg("mydos")
        .assert()
        .success()
        .stdout(predicate::str::diff("803\n"));
    Ok(())
}

#[test]
fn completions() -> STDRESULT {
    Command::cargo_bin("a8kit")?
        .arg("completions").arg("-s").arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("a8kit"));
    Ok(())
}
