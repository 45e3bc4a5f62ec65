//! URL builders for the pages linked from hovers, diagnostics and document links

use crate::config::NPMX_DEV;

const NPMJS_COM: &str = "https://www.npmjs.com";
const JSR_IO: &str = "https://jsr.io";
const MDN_REFERENCE: &str = "https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference";
const E18E_REPLACEMENTS: &str = "https://e18e.dev/docs/replacements";
const OSV_DEV: &str = "https://osv.dev";

pub fn npm_package_url(name: &str, version: &str) -> String {
    format!("{NPMJS_COM}/package/{name}/v/{version}")
}

pub fn npmx_package_url(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{NPMX_DEV}/package/{name}/v/{version}"),
        None => format!("{NPMX_DEV}/package/{name}"),
    }
}

pub fn npmx_docs_url(name: &str, version: &str) -> String {
    format!("{NPMX_DEV}/docs/{name}/v/{version}")
}

/// Source view of a file inside a published package, optionally at a
/// one-based line span
pub fn npmx_file_url(
    name: &str,
    version: &str,
    path: &str,
    lines: Option<(u32, u32)>,
) -> String {
    let url = format!("{NPMX_DEV}/package-code/{name}/v/{version}/{path}");
    match lines {
        Some((start, end)) if end > start => format!("{url}#L{start}-L{end}"),
        Some((start, _)) => format!("{url}#L{start}"),
        None => url,
    }
}

pub fn jsr_package_url(name: &str, version: &str) -> String {
    if version.is_empty() {
        format!("{JSR_IO}/{name}")
    } else {
        format!("{JSR_IO}/{name}@{version}")
    }
}

pub fn mdn_url(path: &str) -> String {
    format!("{MDN_REFERENCE}/{path}")
}

pub fn replacements_doc_url(path: &str) -> String {
    format!("{E18E_REPLACEMENTS}/{path}.html")
}

pub fn osv_vulnerability_url(id: &str) -> String {
    format!("{OSV_DEV}/vulnerability/{id}")
}
