//! ExifTool-backed tag store
//!
//! Drives the `exiftool` command line tool: reads use JSON output grouped by
//! location (`-j -G1 -struct`), writes pass one `-TAG=VALUE` argument per
//! value. Only the tags this tool works with are translated between exiv2
//! keys and ExifTool tag names.
//!
//! GPS coordinates are requested in `deg,min` form (`-c "%d,%.8f"`), which
//! yields values such as `43,30.00000000 S`.

use super::{acdsee_region_entry, Namespace, Snapshot, TagMap, TagStore, TagValue};
use super::{
    ACDSEE_KEYWORDS_TAG, DC_SUBJECT_TAG, EXIF_GPS_LATITUDE_TAG, EXIF_GPS_LONGITUDE_TAG,
    EXIF_MAKE_TAG, EXIF_MODEL_TAG, IPTCEXT_EVENT_TAG, IPTCEXT_PERSON_TAG,
    IPTC_GEO_COUNTRY_CODE_TAG, IPTC_GEO_LOCATION_TAG, LR_SUBJECT_TAG, PS_GEO_CITY_TAG,
    PS_GEO_COUNTRY_TAG, PS_GEO_STATE_TAG, XMP_CREATOR_TOOL_TAG,
};
use crate::error::{TaggerError, TaggerResult};
use crate::tags::store::StoreProvider;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace};

/// Group holding the catalog's face regions
const REGION_GROUP: &str = "XMP-acdsee-rs";

/// exiv2 key, ExifTool tag, list-valued
const TAG_NAMES: &[(&str, &str, bool)] = &[
    (ACDSEE_KEYWORDS_TAG, "XMP-acdsee:Keywords", true),
    (LR_SUBJECT_TAG, "XMP-lr:HierarchicalSubject", true),
    (DC_SUBJECT_TAG, "XMP-dc:Subject", true),
    (IPTCEXT_PERSON_TAG, "XMP-iptcExt:PersonInImage", true),
    (IPTCEXT_EVENT_TAG, "XMP-iptcExt:Event", false),
    (EXIF_GPS_LATITUDE_TAG, "XMP-exif:GPSLatitude", false),
    (EXIF_GPS_LONGITUDE_TAG, "XMP-exif:GPSLongitude", false),
    (XMP_CREATOR_TOOL_TAG, "XMP-xmp:CreatorTool", false),
    (PS_GEO_CITY_TAG, "XMP-photoshop:City", false),
    (PS_GEO_COUNTRY_TAG, "XMP-photoshop:Country", false),
    (PS_GEO_STATE_TAG, "XMP-photoshop:State", false),
    (EXIF_MAKE_TAG, "IFD0:Make", false),
    (EXIF_MODEL_TAG, "IFD0:Model", false),
    (IPTC_GEO_COUNTRY_CODE_TAG, "IPTC:Country-PrimaryLocationCode", false),
    (IPTC_GEO_LOCATION_TAG, "IPTC:Sub-location", false),
];

fn exiftool_name(key: &str) -> Option<(&'static str, bool)> {
    TAG_NAMES
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, name, list)| (*name, *list))
}

/// Provider spawning `exiftool` for every read and write
#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: PathBuf,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("exiftool"),
        }
    }
}

impl ExifTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl StoreProvider for ExifTool {
    fn open(&self, path: &Path) -> TaggerResult<Box<dyn TagStore>> {
        if !path.exists() {
            return Err(TaggerError::PathNotFound(path.to_path_buf()));
        }
        Ok(Box::new(ExifToolStore {
            binary: self.binary.clone(),
            path: path.to_path_buf(),
        }))
    }
}

/// Tag store for one file
#[derive(Debug)]
pub struct ExifToolStore {
    binary: PathBuf,
    path: PathBuf,
}

impl ExifToolStore {
    fn run(&self, args: &[String]) -> TaggerResult<Vec<u8>> {
        trace!("exiftool {:?} {}", args, self.path.display());
        let output = Command::new(&self.binary)
            .args(args)
            .arg(&self.path)
            .output()
            .map_err(|e| TaggerError::TagStore(format!("failed to run exiftool: {}", e)))?;

        if !output.status.success() {
            return Err(TaggerError::TagStore(format!(
                "exiftool failed on {}: {}",
                self.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Run a JSON read and return the object describing the file
    fn read_json(&self, selectors: Vec<String>) -> TaggerResult<serde_json::Map<String, Value>> {
        let mut args: Vec<String> = ["-j", "-G1", "-struct", "-charset", "UTF8", "-c", "%d,%.8f"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(selectors);

        let stdout = self.run(&args)?;
        let mut files: Vec<serde_json::Map<String, Value>> = serde_json::from_slice(&stdout)?;
        files
            .pop()
            .ok_or_else(|| TaggerError::TagStore(format!("no output for {}", self.path.display())))
    }
}

impl TagStore for ExifToolStore {
    fn read(&mut self, namespace: Namespace) -> TaggerResult<TagMap> {
        let mut selectors: Vec<String> = TAG_NAMES
            .iter()
            .filter(|(key, _, _)| Namespace::of(key) == Some(namespace))
            .map(|(_, name, _)| format!("-{}", name))
            .collect();
        if namespace == Namespace::Xmp {
            selectors.push(format!("-{}:all", REGION_GROUP));
        }

        let object = self.read_json(selectors)?;
        let mut tags = TagMap::new();

        for (key, name, list) in TAG_NAMES {
            if let Some(value) = object.get(*name) {
                if let Some(value) = to_tag_value(value, *list) {
                    tags.insert(key.to_string(), value);
                }
            }
        }

        for (name, value) in &object {
            if name.starts_with(REGION_GROUP) {
                flatten_regions(value, &mut tags);
            }
        }

        debug!("Read {} {} tags from {}", tags.len(), namespace, self.path.display());
        Ok(tags)
    }

    fn write(&mut self, namespace: Namespace, tags: &Snapshot) -> TaggerResult<()> {
        let mut args = vec![
            "-overwrite_original".to_string(),
            "-charset".to_string(),
            "UTF8".to_string(),
        ];

        for (key, value) in tags {
            let (name, _) = exiftool_name(key).ok_or_else(|| {
                TaggerError::TagStore(format!("no exiftool name for {}", key))
            })?;
            if Namespace::of(key) != Some(namespace) {
                return Err(TaggerError::TagStore(format!("{} is not a {} tag", key, namespace)));
            }

            match value {
                None => args.push(format!("-{}=", name)),
                Some(TagValue::Text(text)) => args.push(format!("-{}={}", name, text)),
                Some(TagValue::List(items)) if items.is_empty() => args.push(format!("-{}=", name)),
                Some(TagValue::List(items)) => {
                    args.extend(items.iter().map(|item| format!("-{}={}", name, item)));
                }
            }
        }

        debug!("Writing {} {} tags to {}", tags.len(), namespace, self.path.display());
        self.run(&args)?;
        Ok(())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// ExifTool collapses single-item lists to scalars; list tags are re-wrapped
fn to_tag_value(value: &Value, list: bool) -> Option<TagValue> {
    match value {
        Value::Array(items) => Some(TagValue::List(items.iter().filter_map(scalar_text).collect())),
        other => {
            let text = scalar_text(other)?;
            Some(if list {
                TagValue::List(vec![text])
            } else {
                TagValue::Text(text)
            })
        }
    }
}

/// Find a `RegionList` array anywhere below `value` and flatten it into
/// exiv2-style region entry keys
fn flatten_regions(value: &Value, tags: &mut TagMap) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(regions)) = map.get("RegionList") {
                for (i, region) in regions.iter().enumerate() {
                    let Value::Object(fields) = region else { continue };
                    for field in ["Type", "Name"] {
                        if let Some(text) = fields.get(field).and_then(scalar_text) {
                            tags.insert(acdsee_region_entry(i + 1, field), TagValue::Text(text));
                        }
                    }
                }
                return;
            }
            for child in map.values() {
                flatten_regions(child, tags);
            }
        }
        Value::Array(items) => {
            for item in items {
                flatten_regions(item, tags);
            }
        }
        _ => {}
    }
}
