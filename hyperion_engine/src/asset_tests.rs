use super::*;

// ============================================================================
// FileAssetLoader
// ============================================================================

#[test]
fn test_file_loader_reads_relative_to_root() {
    let root = std::env::temp_dir().join(format!("hyperion_assets_{}", std::process::id()));
    std::fs::create_dir_all(root.join("vkshaders")).unwrap();
    std::fs::write(root.join("vkshaders/blit.spv"), [3u8, 2, 2, 7]).unwrap();

    let loader = FileAssetLoader::new(&root);
    let bytes = loader.load_bytes("vkshaders/blit.spv").unwrap();

    assert_eq!(bytes, vec![3, 2, 2, 7]);
    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_file_loader_missing_file_is_not_found() {
    let loader = FileAssetLoader::new(std::env::temp_dir());
    let result = loader.load_bytes("hyperion_does_not_exist/missing.spv");

    assert!(matches!(result, Err(Error::NotFound(_))));
}

// ============================================================================
// MemoryAssetLoader
// ============================================================================

#[test]
fn test_memory_loader() {
    let mut loader = MemoryAssetLoader::new();
    loader.insert("a.spv", vec![1, 2, 3, 4]);

    assert_eq!(loader.load_bytes("a.spv").unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(
        loader.load_bytes("b.spv"),
        Err(Error::NotFound("b.spv".to_string()))
    );
}
