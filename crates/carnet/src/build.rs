use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

use colored::{ColoredString, Colorize};
use log::info;

use crate::{
    BuildOptions, BuildOutput,
    content::Post,
    errors::{BuildError, CarnetError},
    logging::{FormatElapsedTimeOptions, format_elapsed_time, print_title},
    pipeline::ContentPipeline,
    templates,
};

pub mod metadata;
pub mod options;

/// Stylesheet href used when the static directory provides none, which is
/// also what the dev server serves its stylesheet under.
pub const DEV_STYLESHEET: &str = "/style.css";

/// Builds the full static site: static assets, one page per post, the
/// archive page and the posts metadata export.
pub fn build(options: &BuildOptions) -> Result<BuildOutput, CarnetError> {
    let build_start = Instant::now();
    let mut build_metadata = BuildOutput::new(build_start);

    if options.clean_output_dir {
        // A missing output directory is not an error on the first build.
        match fs::remove_dir_all(&options.output_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    fs::create_dir_all(&options.output_dir)?;

    info!(target: "build", "Output directory: {}", options.output_dir.display());

    if options.static_dir.exists() {
        let assets_start = Instant::now();
        print_title("copying assets");

        copy_recursively(&options.static_dir, &options.output_dir, &mut build_metadata).map_err(
            |source| BuildError::StaticCopyFailed {
                path: options.static_dir.clone(),
                source,
            },
        )?;

        info!(target: "build", "{}", format!("Assets copied in {}", format_elapsed_time(assets_start.elapsed(), &FormatElapsedTimeOptions::default())).bold());
    }

    let stylesheet = select_stylesheet(options, &build_metadata);

    let content_start = Instant::now();
    print_title("loading content");

    let pipeline = ContentPipeline::new(&options.content_root);
    let posts = pipeline.posts()?;

    info!(target: "content", "{}", format!("{} posts loaded in {}", posts.len(), format_elapsed_time(content_start.elapsed(), &FormatElapsedTimeOptions::default())).bold());

    print_title("generating pages");
    let pages_start = Instant::now();

    let page_format_options = FormatElapsedTimeOptions {
        additional_fn: Some(&|msg: ColoredString| {
            let formatted_msg = format!("(+{})", msg);
            if msg.fgcolor.is_none() {
                formatted_msg.dimmed()
            } else {
                formatted_msg.into()
            }
        }),
        ..Default::default()
    };

    let section_format_options = FormatElapsedTimeOptions {
        sec_red_threshold: 5,
        sec_yellow_threshold: 1,
        millis_red_threshold: None,
        millis_yellow_threshold: None,
        ..Default::default()
    };

    for post in posts.iter() {
        let page_start = Instant::now();

        let route = format!("/posts/{}/", post.slug);
        let file_path = options
            .output_dir
            .join("posts")
            .join(&post.slug)
            .join("index.html");
        write_page(&file_path, &render_post(post, &stylesheet, options))?;

        info!(target: "pages", "{} -> {} {}", route, file_path.to_string_lossy().dimmed(), format_elapsed_time(page_start.elapsed(), &page_format_options));
        build_metadata.add_page(route, file_path.to_string_lossy().to_string());
    }

    // The archive page is emitted even for a site with zero posts.
    let summaries = pipeline.posts_metadata()?;
    let archive_path = options.output_dir.join("posts").join("index.html");
    write_page(
        &archive_path,
        &templates::archive_page(&summaries, &stylesheet).into_string(),
    )?;
    build_metadata.add_page(
        "/posts/".to_string(),
        archive_path.to_string_lossy().to_string(),
    );

    let metadata_path = options.output_dir.join("api").join("posts.json");
    let metadata_json = serde_json::to_string(&summaries)
        .map_err(|source| BuildError::MetadataSerialize { source })?;
    write_page(&metadata_path, &metadata_json)?;
    build_metadata.add_page(
        "/api/posts.json".to_string(),
        metadata_path.to_string_lossy().to_string(),
    );

    info!(target: "pages", "{}", format!("generated {} pages in {}", build_metadata.pages.len(), format_elapsed_time(pages_start.elapsed(), &section_format_options)).bold());

    info!(target: "SKIP_FORMAT", "{}", "");
    info!(target: "build", "{}", format!("Build completed in {}", format_elapsed_time(build_start.elapsed(), &section_format_options)).bold());

    Ok(build_metadata)
}

fn render_post(post: &Post, stylesheet: &str, options: &BuildOptions) -> String {
    templates::post_page(post, stylesheet, options.base_url.as_deref()).into_string()
}

/// Picks the stylesheet href every generated page links.
///
/// `style.css` at the static directory root wins, then the first copied
/// `.css` asset, then [`DEV_STYLESHEET`] as a last resort.
fn select_stylesheet(options: &BuildOptions, build_metadata: &BuildOutput) -> String {
    let entry = options.static_dir.join("style.css");
    if entry.exists() {
        return DEV_STYLESHEET.to_string();
    }

    build_metadata
        .static_files
        .iter()
        .find(|asset| asset.file_path.ends_with(".css"))
        .and_then(|asset| asset_href(&options.output_dir, Path::new(&asset.file_path)))
        .unwrap_or_else(|| DEV_STYLESHEET.to_string())
}

/// Converts an output file path to the absolute href it is served under.
fn asset_href(output_dir: &Path, file_path: &Path) -> Option<String> {
    let relative = file_path.strip_prefix(output_dir).ok()?;
    let mut href = String::from("/");
    let parts: Vec<_> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect();
    href.push_str(&parts.join("/"));
    Some(href)
}

fn copy_recursively(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    build_metadata: &mut BuildOutput,
) -> io::Result<()> {
    fs::create_dir_all(&destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let filetype = entry.file_type()?;
        if filetype.is_dir() {
            copy_recursively(
                entry.path(),
                destination.as_ref().join(entry.file_name()),
                build_metadata,
            )?;
        } else {
            fs::copy(entry.path(), destination.as_ref().join(entry.file_name()))?;

            build_metadata.add_static_file(
                destination
                    .as_ref()
                    .join(entry.file_name())
                    .to_string_lossy()
                    .to_string(),
                entry.path().to_string_lossy().to_string(),
            );
        }
    }
    Ok(())
}

fn write_page(file_path: &PathBuf, content: &str) -> Result<(), BuildError> {
    let write = |path: &PathBuf| -> io::Result<()> {
        if let Some(parent_dir) = path.parent() {
            fs::create_dir_all(parent_dir)?;
        }
        fs::write(path, content)
    };

    write(file_path).map_err(|source| BuildError::WriteFailed {
        path: file_path.clone(),
        source,
    })
}
