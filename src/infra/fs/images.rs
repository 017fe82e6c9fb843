//! Best-effort locator for design images on the shared design drive.
//!
//! Folders on the share are named after sales staff (`大阪本社　09：沖本`),
//! and workbook names carry the same person in brackets
//! (`本社009　2025年度用日報【沖本】.xlsm`). Every walk is bounded in depth
//! and result count; the share is slow and parts of it are unreadable.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::UNIX_EPOCH;

use regex::Regex;
use walkdir::WalkDir;

use crate::domain::entities::lookup::{ImageEntry, ImageResults};
use crate::usecase::ports::repo::StoreError;

pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "pdf"];

const LIST_MAX_DEPTH: usize = 4;
const LIST_MAX_RESULTS: usize = 100;
const SEARCH_MAX_DEPTH: usize = 3;
const SEARCH_MAX_RESULTS: usize = 50;
/// Candidates gathered before ranking; only the newest `SEARCH_MAX_RESULTS` are returned.
const SEARCH_MAX_CANDIDATES: usize = 1000;
const MIN_QUERY_CHARS: usize = 2;

static BRACKETED_NAME: OnceLock<Regex> = OnceLock::new();
static TITLE_SUFFIX: OnceLock<Regex> = OnceLock::new();
static DESIGN_ID: OnceLock<Regex> = OnceLock::new();

/// Name inside `【…】`, else the file stem.
pub fn extract_name(filename: &str) -> String {
    let re = BRACKETED_NAME
        .get_or_init(|| Regex::new(r"【(.*?)】").expect("bracket regex should compile"));
    match re.captures(filename).and_then(|caps| caps.get(1)) {
        Some(name) => name.as_str().to_string(),
        None => Path::new(filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

pub fn normalize_name(text: &str) -> String {
    text.replace('（', "(")
        .replace('）', ")")
        .replace('　', " ")
        .trim()
        .to_string()
}

/// `山下(和)次長` -> `山下(和)`
pub fn strip_title(name: &str) -> String {
    let re = TITLE_SUFFIX.get_or_init(|| {
        Regex::new(r"(?i)(MGR|Mgr|次長|課長|部長|係長|主任|担当|顧問|専務|常務|社長)$")
            .expect("title regex should compile")
    });
    re.replace(name, "").into_owned()
}

fn looks_like_design_id(name: &str) -> bool {
    DESIGN_ID
        .get_or_init(|| Regex::new(r"\d{5,}").expect("design id regex should compile"))
        .is_match(name)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

fn sort_newest_first(images: &mut [ImageEntry]) {
    images.sort_by(|a, b| b.mtime.total_cmp(&a.mtime));
}

pub struct ImageLocator {
    design_dir: PathBuf,
    folder_mapping: HashMap<String, String>,
}

impl ImageLocator {
    pub fn new(design_dir: impl Into<PathBuf>, folder_mapping: HashMap<String, String>) -> Self {
        Self {
            design_dir: design_dir.into(),
            folder_mapping,
        }
    }

    fn top_level_dirs(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.design_dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::error!(
                    "failed to list design dir {}: {err}",
                    self.design_dir.display()
                );
                return Vec::new();
            }
        };
        let mut dirs: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        dirs.sort();
        dirs
    }

    /// Top-level design folder belonging to the owner of `filename`.
    pub fn match_folder(&self, filename: &str) -> Option<String> {
        if let Some(mapped) = self.folder_mapping.get(filename) {
            if self.design_dir.join(mapped).is_dir() {
                log::info!("manual folder mapping for {filename}: {mapped}");
                return Some(mapped.clone());
            }
            log::warn!("mapped folder not found: {mapped}");
        }

        let target = normalize_name(&extract_name(filename));
        if target.is_empty() {
            return None;
        }
        let stripped = strip_title(&target);
        let dirs = self.top_level_dirs();

        let find = |needle: &str| {
            dirs.iter()
                .find(|dir| normalize_name(dir).contains(needle))
                .cloned()
        };
        let found = find(&target).or_else(|| {
            (!stripped.is_empty() && stripped != target)
                .then(|| find(&stripped))
                .flatten()
        });
        match &found {
            Some(dir) => log::info!("design folder for {filename}: {dir}"),
            None => log::warn!("no design folder for {target} / {stripped}"),
        }
        found
    }

    fn image_entry(&self, path: &Path, folder: &str) -> Option<ImageEntry> {
        let relative = path.strip_prefix(&self.design_dir).ok()?;
        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Some(ImageEntry {
            name: path.file_name()?.to_string_lossy().into_owned(),
            path: relative.to_string_lossy().into_owned(),
            folder: folder.to_string(),
            mtime,
        })
    }

    pub fn list(&self, filename: &str) -> ImageResults {
        if !self.design_dir.is_dir() {
            log::error!("design directory not found: {}", self.design_dir.display());
            return ImageResults::empty("Design directory not found");
        }
        let Some(folder) = self.match_folder(filename) else {
            return ImageResults::empty(format!("No folder found for '{}'", extract_name(filename)));
        };

        let mut images = Vec::new();
        for entry in WalkDir::new(self.design_dir.join(&folder)).max_depth(LIST_MAX_DEPTH) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("skipping unreadable path: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_image(entry.path()) {
                continue;
            }
            if let Some(image) = self.image_entry(entry.path(), &folder) {
                images.push(image);
            }
            if images.len() >= LIST_MAX_RESULTS {
                break;
            }
        }
        sort_newest_first(&mut images);

        ImageResults {
            images,
            folder: Some(folder),
            ..ImageResults::default()
        }
    }

    pub fn search(&self, query: &str, filename: Option<&str>) -> ImageResults {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return ImageResults::empty("Query too short");
        }
        if !self.design_dir.is_dir() {
            return ImageResults::empty("Design directory not found");
        }

        let root = match filename {
            Some(filename) => match self.match_folder(filename) {
                Some(folder) => self.design_dir.join(folder),
                None => return ImageResults::empty("User folder not found from filename"),
            },
            None => self.design_dir.clone(),
        };
        log::debug!("searching {} for '{query}'", root.display());

        let mut images = Vec::new();
        self.safe_walk(&root, &query.to_lowercase(), 0, false, &mut images);
        sort_newest_first(&mut images);
        images.truncate(SEARCH_MAX_RESULTS);

        ImageResults {
            images,
            query: Some(query.to_string()),
            ..ImageResults::default()
        }
    }

    /// Once a directory name contains the query every image below it matches.
    /// Outside such a subtree, folders named like another design id are skipped.
    fn safe_walk(
        &self,
        dir: &Path,
        query: &str,
        depth: usize,
        parent_matches: bool,
        results: &mut Vec<ImageEntry>,
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("failed to list {}: {err}", dir.display());
                return;
            }
        };
        let folder = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut subdirs = Vec::new();
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let name_lower = name.to_lowercase();
            let name_matches = name_lower.contains(query);

            if (parent_matches || name_matches) && is_image(&path) && path.is_file() {
                if let Some(image) = self.image_entry(&path, &folder) {
                    results.push(image);
                }
                continue;
            }

            if depth >= SEARCH_MAX_DEPTH || name.contains('.') || !path.is_dir() {
                continue;
            }
            let matches = parent_matches || name_matches;
            if !matches && looks_like_design_id(&name) {
                continue;
            }
            subdirs.push((path, matches));
        }

        for (subdir, matches) in subdirs {
            self.safe_walk(&subdir, query, depth + 1, matches, results);
            if results.len() >= SEARCH_MAX_CANDIDATES {
                break;
            }
        }
    }

    /// Maps a client-supplied relative path back onto the design drive.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let relative_path = Path::new(relative);
        let escapes = relative_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            log::warn!("rejected image path: {relative}");
            return Err(StoreError::Forbidden);
        }
        let full = self.design_dir.join(relative_path);
        if !full.is_file() {
            return Err(StoreError::NotFound("Image not found".to_string()));
        }
        Ok(full)
    }
}
