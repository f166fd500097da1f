use facewatch_core::gallery::{GalleryError, GalleryProvider};
use facewatch_core::types::ImageSource;
use facewatch_gallery::{open, DirectoryGallery, ManifestGallery};
use std::fs;

#[test]
fn test_directory_lists_images_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["zoe.png", "adam.JPG", "notes.txt", "mike.webp"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }
    fs::create_dir(dir.path().join("nested.png")).unwrap();

    let entries = DirectoryGallery::new(dir.path()).list_entries().unwrap();
    let labels: Vec<&str> = entries.iter().map(|e| e.identity.as_str()).collect();
    assert_eq!(labels, vec!["adam", "mike", "zoe"]);
    assert_eq!(entries[0].source, ImageSource::Path(dir.path().join("adam.JPG")));
}

#[test]
fn test_directory_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = DirectoryGallery::new(dir.path().join("gone"))
        .list_entries()
        .unwrap_err();
    assert!(matches!(err, GalleryError::NotFound(_)));
}

#[test]
fn test_manifest_is_reread_each_listing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery.toml");
    fs::write(&path, "[[subject]]\nlabel = \"a\"\nphoto = \"a.png\"\n").unwrap();

    let gallery = ManifestGallery::new(&path);
    let first = gallery.list_entries().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].source, ImageSource::Path(dir.path().join("a.png")));

    fs::write(
        &path,
        "[[subject]]\nlabel = \"a\"\nphoto = \"a.png\"\n\n[[subject]]\nlabel = \"b\"\nphoto = \"b.png\"\n",
    )
    .unwrap();
    assert_eq!(gallery.list_entries().unwrap().len(), 2);
}

#[test]
fn test_manifest_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[[subject]\nlabel = ").unwrap();
    let err = ManifestGallery::new(&path).list_entries().unwrap_err();
    assert!(matches!(err, GalleryError::Manifest { .. }));
}

#[test]
fn test_open_picks_provider() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("eve.png"), b"x").unwrap();
    let manifest = dir.path().join("list.toml");
    fs::write(&manifest, "[[subject]]\nlabel = \"frank\"\nphoto = \"eve.png\"\n").unwrap();

    let from_dir = open(dir.path()).unwrap().list_entries().unwrap();
    assert_eq!(from_dir.len(), 1);
    assert_eq!(from_dir[0].identity, "eve");

    let from_manifest = open(&manifest).unwrap().list_entries().unwrap();
    assert_eq!(from_manifest[0].identity, "frank");

    assert!(matches!(
        open(&dir.path().join("nothing")),
        Err(GalleryError::NotFound(_))
    ));
}
