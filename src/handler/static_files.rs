//! Static file serving module
//!
//! Resolves GET/HEAD paths against the serving root, with index-file
//! fallback for directories and conditional-request support.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, response};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve a static file from the serving root, or 404
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match load(
        &state.serving_root,
        ctx.path,
        &state.config.serving.index_files,
    )
    .await
    {
        Some((content, content_type)) => {
            let etag = cache::generate_etag(&content);
            if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
                return http::build_304_response(&etag);
            }
            response::build_file_response(content, content_type, &etag, ctx.is_head)
        }
        None => http::build_404_response(),
    }
}

/// Strip the leading slash and traversal sequences from a request path
///
/// This is only the first line of defense; containment is enforced by the
/// canonical-path check in `load`.
pub(crate) fn clean_request_path(path: &str) -> String {
    path.trim_start_matches('/')
        .replace("..", "")
        .trim_start_matches('/')
        .to_string()
}

/// Load file bytes and content type for a request path
///
/// Returns None for anything that should answer 404: missing files,
/// unreadable files, directories without an index file, and paths that
/// resolve outside the serving root.
async fn load(
    root: &Path,
    request_path: &str,
    index_files: &[String],
) -> Option<(Vec<u8>, &'static str)> {
    let clean = clean_request_path(request_path);
    let mut file_path = root.join(&clean);

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Serving root not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // Directory path (or empty / trailing slash): fall back to index files
    if file_path.is_dir() || clean.is_empty() || clean.ends_with('/') {
        file_path = index_files
            .iter()
            .map(|index| file_path.join(index))
            .find(|candidate| candidate.is_file())?;
    }

    // Missing files are routine 404s, not worth a log line
    let file_canonical = file_path.canonicalize().ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {request_path} -> {}",
            file_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                file_canonical.display()
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_clean_request_path() {
        assert_eq!(clean_request_path("/css/style.css"), "css/style.css");
        assert_eq!(clean_request_path("/"), "");
        assert_eq!(clean_request_path("/index.html"), "index.html");
        // Traversal sequences are stripped, never resolved
        assert_eq!(clean_request_path("/../etc/passwd"), "etc/passwd");
        assert_eq!(clean_request_path("/a/../../b"), "a//b");
    }

    /// Build a disposable serving tree under the system temp directory
    fn setup_root(name: &str) -> PathBuf {
        let base = std::env::temp_dir().join(format!(
            "demo_webserver_{}_{}",
            name,
            std::process::id()
        ));
        let root = base.join("public");
        std::fs::create_dir_all(root.join("css")).unwrap();
        std::fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();
        std::fs::write(root.join("css").join("style.css"), b"body{}").unwrap();
        std::fs::write(base.join("secret.txt"), b"outside").unwrap();
        root
    }

    fn teardown(root: &Path) {
        if let Some(base) = root.parent() {
            let _ = std::fs::remove_dir_all(base);
        }
    }

    #[tokio::test]
    async fn test_load_existing_file_returns_exact_bytes() {
        let root = setup_root("load");
        let index_files = vec!["index.html".to_string()];

        let (content, content_type) = load(&root, "/css/style.css", &index_files)
            .await
            .expect("file should load");
        assert_eq!(content, b"body{}");
        assert_eq!(content_type, "text/css");

        teardown(&root);
    }

    #[tokio::test]
    async fn test_load_directory_falls_back_to_index() {
        let root = setup_root("index");
        let index_files = vec!["index.html".to_string(), "index.htm".to_string()];

        let (content, content_type) = load(&root, "/", &index_files)
            .await
            .expect("index should load");
        assert_eq!(content, b"<h1>home</h1>");
        assert_eq!(content_type, "text/html; charset=utf-8");

        teardown(&root);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let root = setup_root("missing");
        let index_files = vec!["index.html".to_string()];

        assert!(load(&root, "/nope.html", &index_files).await.is_none());

        teardown(&root);
    }

    #[tokio::test]
    async fn test_traversal_outside_root_is_rejected() {
        let root = setup_root("traversal");
        let index_files = vec!["index.html".to_string()];

        // secret.txt exists one level above the serving root
        assert!(load(&root, "/../secret.txt", &index_files).await.is_none());

        teardown(&root);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_rejected() {
        let root = setup_root("symlink");
        let index_files = vec!["index.html".to_string()];

        // Resolves to base/secret.txt, outside the canonical root
        std::os::unix::fs::symlink(
            root.parent().unwrap().join("secret.txt"),
            root.join("link.txt"),
        )
        .unwrap();

        assert!(load(&root, "/link.txt", &index_files).await.is_none());

        teardown(&root);
    }
}
