//! Names used to smuggle unsupported files past the service's extension
//! filter: `report.pdf` is uploaded as `report.pdf.epub.zip` and split parts
//! as `movie.mkv.03.zip`.

use std::sync::OnceLock;

use regex::Regex;

pub const SUPPORTED_SUFFIXES: &[&str] = &[
    "doc", "docx", "zip", "rar", "apk", "ipa", "txt", "exe", "7z", "e", "z", "ct", "ke", "db",
    "tar", "pdf", "w3x", "epub", "mobi", "azw", "azw3", "osk", "osz", "xpa", "cpk", "lua", "jar",
    "dmg", "ppt", "pptx", "xls", "xlsx", "mp3", "iso", "img", "gho", "ttf", "ttc", "txf", "dwg",
    "bat", "dll", "crx", "xapk", "conf", "deb", "rp", "rpm", "mobileconfig", "appimage", "flac",
    "cad", "hwt", "accdb", "ce", "xmind", "enc", "bds", "bdi", "ssf", "it", "pkg", "cfg",
];

pub const SAFE_SUFFIXES: &[&str] = &["epub", "zip", "tar", "apk", "txt", "dmg"];

fn last_extension_re() -> &'static Regex {
    static LAST_EXTENSION_RE: OnceLock<Regex> = OnceLock::new();
    LAST_EXTENSION_RE.get_or_init(|| Regex::new(r"\.[0-9A-Za-z_]+$").unwrap())
}

fn has_supported_suffix(name: &str) -> bool {
    SUPPORTED_SUFFIXES
        .iter()
        .any(|suffix| name.strip_suffix(suffix).is_some_and(|rest| rest.ends_with('.')))
}

fn strip_extension(name: &str) -> &str {
    match last_extension_re().find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

pub fn is_specific_file(name: &str) -> bool {
    static LEGACY_INDEX_RE: OnceLock<Regex> = OnceLock::new();
    static PART_INDEX_RE: OnceLock<Regex> = OnceLock::new();

    if name.is_empty() {
        return false;
    }

    // first generation: `name.lzy.zip`, split parts end with a digit
    if let Some(stem) = name.strip_suffix(".lzy.zip") {
        return !LEGACY_INDEX_RE
            .get_or_init(|| Regex::new(r"\d$").unwrap())
            .is_match(stem);
    }

    if !has_supported_suffix(name) {
        return false;
    }
    let name = strip_extension(name);
    if !has_supported_suffix(name) {
        return false;
    }
    let name = strip_extension(name);

    let is_part = PART_INDEX_RE
        .get_or_init(|| Regex::new(r"\.\d+$").unwrap())
        .is_match(name);
    !is_part && last_extension_re().is_match(name)
}

/// Drops the two disguise suffixes from a specific file name.
pub fn restore_file_name(name: &str) -> String {
    static DISGUISE_RE: OnceLock<Regex> = OnceLock::new();

    if !is_specific_file(name) {
        return name.into();
    }
    DISGUISE_RE
        .get_or_init(|| Regex::new(r"\.[0-9A-Za-z_]+?\.[0-9A-Za-z_]+$").unwrap())
        .replace(name, "")
        .into_owned()
}

pub fn fix_file_name(name: &str) -> String {
    static ILLEGAL_RE: OnceLock<Regex> = OnceLock::new();
    ILLEGAL_RE
        .get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap())
        .replace_all(name, "_")
        .into_owned()
}

/// Name of one split part, the index padded to the width of `total`.
pub fn create_specific_index_name(file_name: &str, suffix: &str, index: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("{file_name}.{index:0>width$}.{suffix}")
}

/// Disguised name built from two safe suffixes picked by `seed`.
pub fn create_specific_name(file_name: &str, seed: usize) -> String {
    let count = SAFE_SUFFIXES.len();
    let first = SAFE_SUFFIXES[seed % count];
    let second = SAFE_SUFFIXES[(seed / count) % count];
    format!("{file_name}.{first}.{second}")
}

pub fn is_file(name: &str) -> bool {
    static EXTENSION_RE: OnceLock<Regex> = OnceLock::new();
    EXTENSION_RE
        .get_or_init(|| Regex::new(r"\.[0-9a-zA-Z]+$").unwrap())
        .is_match(name)
}
