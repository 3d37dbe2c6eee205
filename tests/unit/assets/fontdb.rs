use super::*;

#[test]
fn style_names_map_to_weight_and_slant() {
    assert_eq!(style_traits("Regular"), (400, false));
    assert_eq!(style_traits("Semi Bold"), (600, false));
    assert_eq!(style_traits("SemiBold"), (600, false));
    assert_eq!(style_traits("Bold Italic"), (700, true));
    assert_eq!(style_traits("Italic"), (400, true));
    assert_eq!(style_traits("ExtraLight"), (200, false));
    assert_eq!(style_traits("Black"), (900, false));
}

#[test]
fn empty_database_has_no_fonts() {
    let db = FontDatabase::empty();
    assert!(matches!(
        db.load(&FontName::new("Inter", "Regular")),
        Err(SceneError::Resolution(_))
    ));
}

#[test]
fn missing_font_directory_is_tolerated() {
    let mut db = fontdb::Database::new();
    load_fonts_from_dir(&mut db, Path::new("/definitely/not/a/font/dir"));
    assert_eq!(db.len(), 0);
}
