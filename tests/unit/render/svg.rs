use super::*;
use crate::materialize::fonts::FontName;
use crate::materialize::host::{Host, RangeStyle, TextResize};

fn content(characters: &str, ranges: Vec<RangeStyle>) -> TextContent {
    TextContent {
        characters: characters.to_owned(),
        font: FontName::new("Inter", "Bold"),
        font_size: 12.0,
        color: Rgba::gray(0.0),
        letter_spacing: None,
        line_height: None,
        align: TextAlignH::Left,
        underline: false,
        strikethrough: false,
        resize: TextResize::WidthAndHeight,
        ranges,
    }
}

#[test]
fn lines_split_and_ranges_color_segments() {
    let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
    let t = content(
        "ab\ncd",
        vec![RangeStyle {
            start: 1,
            end: 4,
            font_size: None,
            color: Some(red),
        }],
    );
    let lines = text_lines(&t);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].len(), 2);
    assert_eq!(lines[0][0].text, "a");
    assert_eq!(lines[0][1].color, Some(red));
    assert_eq!(lines[1][0].text, "c");
    assert_eq!(lines[1][0].color, Some(red));
    assert_eq!(lines[1][1].color, None);
}

#[test]
fn surrogate_pairs_count_two_units() {
    let t = content(
        "😀x",
        vec![RangeStyle {
            start: 2,
            end: 3,
            font_size: Some(20.0),
            color: None,
        }],
    );
    let lines = text_lines(&t);
    assert_eq!(lines[0][0].font_size, None);
    assert_eq!(lines[0][1].text, "x");
    assert_eq!(lines[0][1].font_size, Some(20.0));
}

#[test]
fn masks_and_clips_are_emitted_and_parse() {
    let mut host = SceneHost::new();
    let root = host.create_frame().unwrap();
    host.set_geometry(root, 0.0, 0.0, 50.0, 40.0).unwrap();
    host.set_clips_content(root, true).unwrap();
    host.set_fills(root, vec![Paint::Solid { color: Rgba::WHITE }])
        .unwrap();

    let mask = host.create_rectangle().unwrap();
    host.set_geometry(mask, 5.0, 5.0, 10.0, 10.0).unwrap();
    host.set_fills(mask, vec![Paint::Solid { color: Rgba::gray(0.0) }])
        .unwrap();
    host.set_mask(mask, true).unwrap();
    host.append_child(root, mask).unwrap();

    let content = host.create_rectangle().unwrap();
    host.set_geometry(content, 0.0, 0.0, 50.0, 40.0).unwrap();
    host.set_fills(
        content,
        vec![Paint::Solid {
            color: Rgba::new(1.0, 0.0, 0.0, 1.0),
        }],
    )
    .unwrap();
    host.set_blend(content, 0.5, BlendMode::Multiply).unwrap();
    host.append_child(root, content).unwrap();

    let svg = to_svg(&host, root.0).unwrap();
    assert!(svg.contains(r#"mask-type="alpha""#));
    assert!(svg.contains("<clipPath"));
    assert!(svg.contains("mix-blend-mode:multiply"));
    assert!(svg.contains(r#"opacity="0.5""#));
    usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
}

#[test]
fn hidden_nodes_are_not_drawn() {
    let mut host = SceneHost::new();
    let root = host.create_frame().unwrap();
    let r = host.create_rectangle().unwrap();
    host.set_fills(
        r,
        vec![Paint::Solid {
            color: Rgba::new(0.0, 0.0, 1.0, 1.0),
        }],
    )
    .unwrap();
    host.set_visible(r, false).unwrap();
    host.append_child(root, r).unwrap();
    let svg = to_svg(&host, root.0).unwrap();
    assert!(!svg.contains("#0000ff"));
}

#[test]
fn unknown_root_is_rejected() {
    let host = SceneHost::new();
    assert!(to_svg(&host, NodeId(7)).is_err());
}
