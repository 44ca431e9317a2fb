/// Virtual filesystem over a scratch directory plus buffer files.
use std::path::PathBuf;

use blitkit::fs::*;

/// Fresh directory per test so parallel tests never share files.
fn scratch(name: &str) -> (Filesystem, PathBuf) {
    let dir = std::env::temp_dir().join(format!("blitkit-fs-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    (Filesystem::new(&dir), dir)
}

#[test]
fn write_then_read_disk_file() {
    let (fs, dir) = scratch("rw");
    let f = File::open(&fs, "/notes.txt", OpenMode::WRITE).unwrap();
    assert_eq!(f.write(0, b"hello world").unwrap(), 11);
    f.write(6, b"there").unwrap();
    drop(f);

    let f = File::open(&fs, "notes.txt", OpenMode::READ).unwrap();
    assert_eq!(f.get_length(), 11);
    let mut buf = [0u8; 5];
    assert_eq!(f.read(6, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"there");
    assert!(f.get_ptr().is_none());

    // short read at end of file
    let mut tail = [0u8; 8];
    assert_eq!(f.read(9, &mut tail).unwrap(), 2);
    assert_eq!(fs.read_all("notes.txt").unwrap(), b"hello there");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_file_is_not_found() {
    let (fs, dir) = scratch("missing");
    assert!(matches!(File::open(&fs, "nope.bin", OpenMode::READ), Err(FsError::NotFound(_))));
    assert!(!fs.file_exists("nope.bin"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn closed_file_refuses_io() {
    let (fs, dir) = scratch("closed");
    let mut f = File::open(&fs, "a.txt", OpenMode::READ | OpenMode::WRITE).unwrap();
    assert!(f.is_open());
    f.close();
    assert!(!f.is_open());
    assert!(matches!(f.read(0, &mut [0u8; 1]), Err(FsError::NotOpen)));
    assert!(matches!(f.write(0, b"x"), Err(FsError::NotOpen)));
    assert_eq!(f.get_length(), 0);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn buffer_files_are_read_only() {
    let (mut fs, dir) = scratch("buffers");
    fs.add_buffer_file("/assets/level1.tmx", b"MTMX".to_vec());

    assert!(fs.file_exists("assets/level1.tmx"));
    assert!(fs.directory_exists("assets"));
    assert!(matches!(
        File::open(&fs, "assets/level1.tmx", OpenMode::WRITE),
        Err(FsError::ReadOnly(_))
    ));
    assert!(matches!(fs.remove_file("assets/level1.tmx"), Err(FsError::ReadOnly(_))));
    assert!(matches!(fs.rename_file("assets/level1.tmx", "x"), Err(FsError::ReadOnly(_))));

    let f = File::open(&fs, "assets/level1.tmx", OpenMode::READ).unwrap();
    assert_eq!(f.get_ptr(), Some(&b"MTMX"[..]));
    assert!(matches!(f.write(0, b"x"), Err(FsError::ReadOnly(_))));
    let _ = std::fs::remove_dir_all(dir);
}

/// Buffer files shadow disk files of the same name in listings.
#[test]
fn listing_merges_disk_and_buffers() {
    let (mut fs, dir) = scratch("list");
    fs.create_directory("sub").unwrap();
    std::fs::write(dir.join("b.txt"), b"disk").unwrap();
    std::fs::write(dir.join("c.txt"), b"disk").unwrap();
    fs.add_buffer_file("a.txt", vec![0u8; 3]);
    fs.add_buffer_file("c.txt", vec![0u8; 10]);
    fs.add_buffer_file("sub/deep.txt", vec![0u8; 1]);

    let names: Vec<String> = fs.list_files("/").into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt", "sub"]);

    let listing = fs.list_files("");
    let c = listing.iter().find(|f| f.name == "c.txt").unwrap();
    assert_eq!(c.size, 10);
    assert!(listing.iter().find(|f| f.name == "sub").unwrap().is_dir());

    let only_txt = fs.list_files_filtered("", |f| f.name.ends_with(".txt"));
    assert_eq!(only_txt.len(), 3);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn walk_finds_nested_files() {
    let (mut fs, dir) = scratch("walk");
    fs.create_directory("a/b").unwrap();
    std::fs::write(dir.join("a/b/c.bin"), b"1").unwrap();
    std::fs::write(dir.join("top.bin"), b"2").unwrap();
    fs.add_buffer_file("a/mem.bin", vec![3]);

    assert_eq!(fs.walk(""), vec!["a/b/c.bin", "a/mem.bin", "top.bin"]);
    assert_eq!(fs.walk("a"), vec!["a/b/c.bin", "a/mem.bin"]);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn rename_and_remove_disk_files() {
    let (fs, dir) = scratch("rename");
    std::fs::write(dir.join("old.txt"), b"x").unwrap();
    fs.rename_file("old.txt", "new.txt").unwrap();
    assert!(!fs.file_exists("old.txt"));
    assert!(fs.file_exists("new.txt"));
    fs.remove_file("new.txt").unwrap();
    assert!(!fs.file_exists("new.txt"));
    assert!(matches!(fs.remove_file("new.txt"), Err(FsError::Io(_))));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn save_slots_read_a_prefix_but_not_past_the_end() {
    let (_, dir) = scratch("saves");
    write_save_bytes(&dir, 2, &[1, 2, 3]).unwrap();
    assert_eq!(save_path(&dir, 2), dir.join("save2"));
    assert_eq!(read_save_bytes(&dir, 2, 3), Some(vec![1, 2, 3]));
    assert_eq!(read_save_bytes(&dir, 2, 2), Some(vec![1, 2]));
    assert_eq!(read_save_bytes(&dir, 2, 4), None);
    assert_eq!(read_save::<u32>(&dir, 7), None);

    write_save(&dir, 7, &0xdead_beef_u32).unwrap();
    assert_eq!(read_save::<u32>(&dir, 7), Some(0xdead_beef));
    let _ = std::fs::remove_dir_all(dir);
}
