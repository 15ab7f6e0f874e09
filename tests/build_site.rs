//! End-to-end builds against throwaway site trees.

use bakehouse::config::{Config, MediaSize, Overrides, PaginationRule, load_config};
use bakehouse::site::{self, BuildContext, BuildEvent};
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// A site with a single home page and a bare layout.
fn minimal_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        &tmp.path().join("pages/index.md"),
        "---\ntitle: Home\n---\nWelcome to the *bakehouse*.\n",
    );
    write(
        &tmp.path().join("layouts/default.html"),
        "<html><head><title>{{title}}</title></head><body>{{content}}</body></html>\n",
    );
    tmp
}

#[test]
fn home_page_is_rendered_through_layout() {
    let tmp = minimal_site();
    let config = Config::with_defaults(tmp.path());
    let out = config.build_dir.clone();

    let report = site::build(&BuildContext::new(config)).unwrap();

    let html = read(&out.join("index.html"));
    assert!(html.contains("<title>Home</title>"));
    assert!(html.contains("<em>bakehouse</em>"));
    assert_eq!(report.written, vec![out.join("index.html")]);
}

#[test]
fn front_matter_false_build_is_not_written() {
    let tmp = minimal_site();
    write(
        &tmp.path().join("pages/draft.md"),
        "---\ntitle: Draft\nbuild: false\n---\nLater.\n",
    );
    let config = Config::with_defaults(tmp.path());
    let out = config.build_dir.clone();

    let report = site::build(&BuildContext::new(config)).unwrap();
    assert!(!out.join("draft.html").exists());
    assert_eq!(report.skipped, 1);
}

#[test]
fn twenty_five_items_paginate_into_three_pages() {
    let tmp = minimal_site();
    let root = tmp.path();
    write(
        &root.join("layouts/list.html"),
        "{{#each pager.resources}}[{{title}}]{{/each}} page {{pager.page}}/{{pager.total_pages}}\n",
    );
    // The listing sorts after the posts, so it is first in site order and
    // anchors the rule: 1 listing + 24 posts.
    write(
        &root.join("pages/news/index.md"),
        "---\ntitle: News\nlayout: list.html\n---\n",
    );
    for i in 0..24 {
        write(
            &root.join(format!("pages/news/a{i:02}.md")),
            &format!("---\ntitle: Post {i:02}\n---\nBody {i}.\n"),
        );
    }

    let mut config = Config::with_defaults(root);
    config
        .pagination
        .insert("news".into(), PaginationRule::new("/news/*", 10));
    let out = config.build_dir.clone();

    let (tx, rx) = mpsc::channel();
    site::build(&BuildContext::with_events(config, tx)).unwrap();

    let paginated: Vec<BuildEvent> = rx
        .iter()
        .filter(|e| matches!(e, BuildEvent::Paginated { .. }))
        .collect();
    assert_eq!(
        paginated,
        vec![BuildEvent::Paginated {
            rule: "news".into(),
            anchor: "/pages/news/index.md".into(),
            pages: 3,
        }]
    );

    // Site order: index, a23, a22, ..., a00. Page 2 holds items 10..19.
    let page1 = read(&out.join("news/index.html"));
    assert!(page1.starts_with("[News][Post 23]"));
    assert!(page1.contains("page 1/3"));

    let page2 = read(&out.join("news/page-2/index.html"));
    assert!(page2.starts_with("[Post 14]"));
    assert!(page2.contains("[Post 05] page 2/3"));
    assert_eq!(page2.matches('[').count(), 10);

    let page3 = read(&out.join("news/page-3/index.html"));
    assert_eq!(page3.matches('[').count(), 5);
    assert!(page3.contains("[Post 00] page 3/3"));
}

#[test]
fn thumbnails_are_written_per_size_and_bad_images_skipped() {
    let tmp = minimal_site();
    let root = tmp.path();
    fs::create_dir_all(root.join("media/Photos")).unwrap();
    image::RgbImage::from_pixel(200, 100, image::Rgb([200, 120, 40]))
        .save(root.join("media/Photos/Sunset Walk.png"))
        .unwrap();
    write(&root.join("media/Photos/broken.jpg"), "not a jpeg");
    write(
        &root.join("layouts/default.html"),
        "{{#each site.media.Photos.list}}<img src=\"{{images.small}}\">{{/each}}{{content}}",
    );

    let mut config = Config::with_defaults(root);
    config.media.insert(
        "small".into(),
        MediaSize {
            width: Some(50),
            height: Some(50),
        },
    );
    let out = config.build_dir.clone();

    let report = site::build(&BuildContext::new(config)).unwrap();
    assert_eq!(report.media_built, 1);
    assert_eq!(report.media_failed, 1);

    let thumb = out.join("photos/sunset-walk-small.png");
    assert_eq!(image::image_dimensions(&thumb).unwrap(), (50, 25));
    // Tree buckets keep the directory name; file names are slugified.
    assert!(read(&out.join("index.html")).contains("<img src=\"/photos/sunset-walk-small.png\">"));
    assert!(!out.join("photos/broken-small.jpg").exists());
}

#[test]
fn assets_are_mirrored_and_pruned() {
    let tmp = minimal_site();
    let root = tmp.path();
    write(&root.join("assets/css/site.css"), "body {\n    color: red;\n}\n");
    let config = Config::with_defaults(root);
    let out = config.build_dir.clone();

    site::build(&BuildContext::new(config.clone())).unwrap();
    assert!(out.join("assets/css/site.css").is_file());

    fs::remove_file(root.join("assets/css/site.css")).unwrap();
    write(&root.join("assets/js/app.js"), "var a = 1;\n");
    site::build(&BuildContext::new(config)).unwrap();

    assert!(!out.join("assets/css/site.css").exists());
    assert!(out.join("assets/js/app.js").is_file());
}

#[test]
fn yaml_config_drives_the_build() {
    let tmp = minimal_site();
    let root = tmp.path();
    write(
        &root.join("site.yaml"),
        "build_dir: public\ncompress: true\nsite_context:\n  name: Crumbs\n",
    );
    write(
        &root.join("layouts/default.html"),
        "{{site.name}} / {{title}} / prod={{site.production}}",
    );
    write(&root.join("assets/site.css"), "body {\n    color: red;\n}\n");

    let config = load_config(Path::new("site.yaml"), &Overrides::default(), root).unwrap();
    site::build(&BuildContext::new(config)).unwrap();

    assert_eq!(
        read(&root.join("public/index.html")),
        "Crumbs / Home / prod=false"
    );
    assert_eq!(read(&root.join("public/assets/site.css")), "body{color:red}");
}

#[test]
fn malformed_front_matter_aborts() {
    let tmp = minimal_site();
    write(
        &tmp.path().join("pages/bad.md"),
        "---\ntitle: [unclosed\n---\nbody\n",
    );
    let result = site::build(&BuildContext::new(Config::with_defaults(tmp.path())));
    assert!(result.is_err());
}
