//! Saved rectangle presets (`saved_rects.txt`)
//!
//! Each line stores one slot:
//!
//! ```text
//! slot=left,top,right,bottom,invert,grayscale,grayLevel
//! ```
//!
//! The older four-field form without color settings is still accepted.
//! Parsing is strict: a line with any malformed field is skipped as a whole
//! and the slot it names keeps whatever it held before.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::split_key_value;
use crate::domain::color::{ColorSettings, GrayLevel};
use crate::domain::core::Rect;

/// Number of slots, addressed 0-9
pub const NUM_SAVED_RECTS: usize = 10;

const FILE_HEADER: &str = "\
# Saved Rectangle Configurations with Color Settings
# Format: SlotNumber=Left,Top,Right,Bottom,Invert,Grayscale,GrayLevel
# Slots 1-9 available. Use 0 to cycle, 1-9 to load, Ctrl+1-9 to save.
# Invert: 1=enabled, 0=disabled
# Grayscale: 1=enabled, 0=disabled
# GrayLevel: 0=100%, 1=80%, 2=60%, 3=40%

";

/// A persisted rectangle together with the color settings active when it
/// was saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SavedRectEntry {
    pub rect: Rect,
    pub colors: ColorSettings,
}

impl SavedRectEntry {
    pub fn new(rect: Rect, colors: ColorSettings) -> Self {
        Self { rect, colors }
    }

    fn to_line(&self, slot: usize) -> String {
        format!(
            "{}={},{},{},{},{},{},{}",
            slot,
            self.rect.left,
            self.rect.top,
            self.rect.right,
            self.rect.bottom,
            u8::from(self.colors.inversion),
            u8::from(self.colors.grayscale),
            self.colors.gray_level.index()
        )
    }
}

/// Errors reading or writing the rectangle file
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open saved rectangles file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to write saved rectangles file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Reasons a single line is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("slot '{0}' is not a number in 0-9")]
    InvalidSlot(String),

    #[error("expected at least 4 fields, found {0}")]
    TooFewFields(usize),

    #[error("field '{0}' is not an integer")]
    InvalidNumber(String),

    #[error("gray level {0} is outside 0-3")]
    InvalidGrayLevel(i64),
}

/// Fixed set of slots backed by a text file
#[derive(Debug, Clone)]
pub struct SavedRectStore {
    path: PathBuf,
    entries: [Option<SavedRectEntry>; NUM_SAVED_RECTS],
}

impl SavedRectStore {
    /// Creates an empty store bound to `path`; nothing is read yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: [None; NUM_SAVED_RECTS],
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file into the store
    ///
    /// Valid lines overwrite their slot; invalid lines are skipped. Only a
    /// file that cannot be opened is an error.
    ///
    /// # Returns
    /// Number of slots populated from the file
    pub fn load(&mut self) -> Result<usize, StoreError> {
        let bytes = fs::read(&self.path).map_err(|source| StoreError::Open {
            path: self.path.clone(),
            source,
        })?;
        // Hand-edited files may carry ANSI-encoded comments
        let contents = String::from_utf8_lossy(&bytes);

        let mut loaded = 0;
        for (index, line) in contents.lines().enumerate() {
            match parse_line(line) {
                Ok(Some((slot, entry))) => {
                    self.entries[slot] = Some(entry);
                    loaded += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(line = index + 1, %err, "Skipping saved rectangle line");
                }
            }
        }

        info!(path = %self.path.display(), loaded, "Loaded saved rectangles");
        Ok(loaded)
    }

    /// Writes every valid slot, in slot order, replacing the file
    pub fn save(&self) -> Result<(), StoreError> {
        let mut contents = String::from(FILE_HEADER);
        for (slot, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                contents.push_str(&entry.to_line(slot));
                contents.push('\n');
            }
        }

        fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Merges this store's valid slots over the file's current contents and
    /// writes the result
    ///
    /// Slots written by another instance survive as long as this store has
    /// nothing in them. Two processes saving at the same moment can still
    /// lose one side's update.
    pub fn save_preserving_existing(&self) -> Result<(), StoreError> {
        let mut on_disk = SavedRectStore::new(self.path.clone());
        if let Err(err) = on_disk.load() {
            debug!(%err, "No existing rectangles to merge");
        }

        for (slot, entry) in self.entries.iter().enumerate() {
            if let Some(entry) = entry {
                on_disk.set_entry(slot, *entry);
            }
        }

        on_disk.save()
    }

    pub fn entry(&self, slot: usize) -> Option<&SavedRectEntry> {
        self.entries.get(slot).and_then(Option::as_ref)
    }

    /// Stores `entry` in `slot`; out-of-range slots are ignored
    pub fn set_entry(&mut self, slot: usize, entry: SavedRectEntry) {
        if let Some(target) = self.entries.get_mut(slot) {
            *target = Some(entry);
        }
    }

    pub fn is_valid(&self, slot: usize) -> bool {
        self.entry(slot).is_some()
    }

    /// Next valid slot after `current` when cycling with the `0` key
    ///
    /// Only slots 1-9 take part; slot 0 is skipped and the search wraps from
    /// 9 back to 1.
    pub fn next_valid_slot(&self, current: usize) -> Option<usize> {
        let mut slot = current;
        for _ in 0..NUM_SAVED_RECTS {
            slot += 1;
            if slot >= NUM_SAVED_RECTS {
                slot = 1;
            }
            if self.is_valid(slot) {
                return Some(slot);
            }
        }
        None
    }
}

/// Parses one line of the rectangle file
///
/// # Returns
/// `Ok(None)` for comments and blank lines, the slot and entry for a valid
/// line, or the reason the line was rejected
pub fn parse_line(line: &str) -> Result<Option<(usize, SavedRectEntry)>, LineError> {
    let Some((slot_text, data)) = split_key_value(line) else {
        return Ok(None);
    };

    let slot = parse_int(slot_text)
        .ok()
        .filter(|slot| (0..NUM_SAVED_RECTS as i64).contains(slot))
        .ok_or_else(|| LineError::InvalidSlot(slot_text.to_string()))? as usize;

    let fields: Vec<&str> = data.split(',').collect();
    if fields.len() < 4 {
        return Err(LineError::TooFewFields(fields.len()));
    }

    let rect = Rect::new(
        parse_coordinate(fields[0])?,
        parse_coordinate(fields[1])?,
        parse_coordinate(fields[2])?,
        parse_coordinate(fields[3])?,
    );

    let colors = if fields.len() >= 7 {
        let level = parse_int(fields[6])?;
        ColorSettings {
            inversion: parse_int(fields[4])? != 0,
            grayscale: parse_int(fields[5])? != 0,
            gray_level: GrayLevel::new(level).ok_or(LineError::InvalidGrayLevel(level))?,
        }
    } else {
        ColorSettings::legacy_default()
    };

    Ok(Some((slot, SavedRectEntry::new(rect, colors))))
}

/// Whole-field integer parse; leading whitespace is allowed, anything left
/// over after the digits is not
fn parse_int(field: &str) -> Result<i64, LineError> {
    field
        .trim_start()
        .parse::<i64>()
        .map_err(|_| LineError::InvalidNumber(field.to_string()))
}

fn parse_coordinate(field: &str) -> Result<i32, LineError> {
    let value = parse_int(field)?;
    i32::try_from(value).map_err(|_| LineError::InvalidNumber(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_slots(store: &SavedRectStore) -> Vec<usize> {
        (0..NUM_SAVED_RECTS).filter(|slot| store.is_valid(*slot)).collect()
    }

    fn colors(inversion: bool, grayscale: bool, level: i64) -> ColorSettings {
        ColorSettings {
            inversion,
            grayscale,
            gray_level: GrayLevel::new(level).unwrap(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SavedRectStore {
        SavedRectStore::new(dir.path().join("saved_rects.txt"))
    }

    #[test]
    fn parses_full_line() {
        let (slot, entry) = parse_line("2=10,20,310,220,1,0,2").unwrap().unwrap();
        assert_eq!(slot, 2);
        assert_eq!(entry.rect, Rect::new(10, 20, 310, 220));
        assert_eq!(entry.colors, colors(true, false, 2));
    }

    #[test]
    fn legacy_line_gets_default_colors() {
        let (slot, entry) = parse_line(" 7 = -5,0,95,100 ").unwrap().unwrap();
        assert_eq!(slot, 7);
        assert_eq!(entry.rect, Rect::new(-5, 0, 95, 100));
        assert_eq!(entry.colors, ColorSettings::legacy_default());
    }

    #[test]
    fn five_or_six_fields_fall_back_to_legacy_colors() {
        let (_, entry) = parse_line("1=0,0,100,100,0,1").unwrap().unwrap();
        assert_eq!(entry.colors, ColorSettings::legacy_default());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("# 1=0,0,100,100"), Ok(None));
        assert_eq!(parse_line("; 1=0,0,100,100"), Ok(None));
        assert_eq!(parse_line("garbage"), Ok(None));
    }

    #[test]
    fn rejects_bad_slots() {
        assert_eq!(
            parse_line("10=0,0,100,100"),
            Err(LineError::InvalidSlot("10".to_string()))
        );
        assert_eq!(
            parse_line("-1=0,0,100,100"),
            Err(LineError::InvalidSlot("-1".to_string()))
        );
        assert_eq!(
            parse_line("3x=0,0,100,100"),
            Err(LineError::InvalidSlot("3x".to_string()))
        );
    }

    #[test]
    fn rejects_short_and_malformed_lines() {
        assert_eq!(parse_line("1=0,0,100"), Err(LineError::TooFewFields(3)));
        assert_eq!(
            parse_line("1=0,0,100,1o0"),
            Err(LineError::InvalidNumber("1o0".to_string()))
        );
        assert_eq!(
            parse_line("1=0,,100,100"),
            Err(LineError::InvalidNumber(String::new()))
        );
        assert_eq!(
            parse_line("1=0,0,100,100,1,0,4"),
            Err(LineError::InvalidGrayLevel(4))
        );
        assert_eq!(
            parse_line("1=0,0,100,100,yes,0,1"),
            Err(LineError::InvalidNumber("yes".to_string()))
        );
    }

    #[test]
    fn leading_whitespace_in_fields_is_accepted() {
        let (_, entry) = parse_line("4=10, 20, 30, 40, 0, 1, 3").unwrap().unwrap();
        assert_eq!(entry.rect, Rect::new(10, 20, 30, 40));
        assert_eq!(entry.colors, colors(false, true, 3));
    }

    #[test]
    fn round_trip_every_slot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);

        for slot in 0..NUM_SAVED_RECTS {
            let offset = slot as i32 * 10;
            let entry = SavedRectEntry::new(
                Rect::new(offset, offset + 1, offset + 200, offset + 150),
                colors(slot % 2 == 0, slot % 3 == 0, (slot % 4) as i64),
            );
            store.set_entry(slot, entry);
        }
        store.save().expect("save");

        let mut reloaded = store_in(&dir);
        assert_eq!(reloaded.load().expect("load"), NUM_SAVED_RECTS);
        for slot in 0..NUM_SAVED_RECTS {
            assert_eq!(reloaded.entry(slot), store.entry(slot), "slot {slot}");
        }
    }

    #[test]
    fn invalid_lines_leave_slots_untouched() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        let existing = SavedRectEntry::new(Rect::new(1, 2, 301, 202), colors(false, false, 1));
        store.set_entry(3, existing);

        fs::write(
            store.path(),
            "3=5,5,50\n12=0,0,100,100,1,1,1\n5=0,0,100,100,1,1,1\n",
        )
        .expect("write");

        assert_eq!(store.load().expect("load"), 1);
        assert_eq!(store.entry(3), Some(&existing));
        assert!(store.is_valid(5));
        assert_eq!(valid_slots(&store), vec![3, 5]);
    }

    #[test]
    fn non_utf8_comment_does_not_hide_valid_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        fs::write(
            store.path(),
            b"# Fen\xeatre\n2=10,20,310,220,1,0,2\n3=0,0,100,100,0,0,0\n",
        )
        .expect("write");

        assert_eq!(store.load().expect("load"), 2);
        assert_eq!(store.entry(2).map(|e| e.rect), Some(Rect::new(10, 20, 310, 220)));

        // Another instance saving must keep both slots from the file
        let mut other = store_in(&dir);
        other.set_entry(5, SavedRectEntry::new(Rect::new(0, 0, 150, 150), colors(true, false, 0)));
        other.save_preserving_existing().expect("save");

        let mut merged = store_in(&dir);
        merged.load().expect("load");
        assert!(merged.is_valid(2));
        assert!(merged.is_valid(3));
        assert!(merged.is_valid(5));
    }

    #[test]
    fn save_writes_header_and_slot_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        store.set_entry(8, SavedRectEntry::new(Rect::new(0, 0, 100, 100), colors(true, true, 3)));
        store.set_entry(2, SavedRectEntry::new(Rect::new(10, 20, 310, 220), colors(true, false, 2)));
        store.save().expect("save");

        let contents = fs::read_to_string(store.path()).expect("read");
        assert!(contents.starts_with("# Saved Rectangle Configurations"));
        let data: Vec<&str> = contents
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        assert_eq!(data, vec!["2=10,20,310,220,1,0,2", "8=0,0,100,100,1,1,3"]);
    }

    #[test]
    fn preserving_save_keeps_other_instance_slots() {
        let dir = tempfile::tempdir().expect("temp dir");

        let mut instance_b = store_in(&dir);
        instance_b.set_entry(3, SavedRectEntry::new(Rect::new(30, 30, 330, 330), colors(false, true, 1)));
        instance_b.save_preserving_existing().expect("save b");

        // A started before B wrote, so it never saw slot 3
        let mut instance_a = store_in(&dir);
        instance_a.set_entry(4, SavedRectEntry::new(Rect::new(40, 40, 440, 440), colors(true, false, 0)));
        instance_a.save_preserving_existing().expect("save a");

        let mut merged = store_in(&dir);
        merged.load().expect("load");
        assert_eq!(merged.entry(3), instance_b.entry(3));
        assert_eq!(merged.entry(4), instance_a.entry(4));
    }

    #[test]
    fn preserving_save_overrides_slots_it_owns() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("saved_rects.txt");
        fs::write(&path, "6=0,0,100,100,0,0,0\n").expect("write");

        let mut store = SavedRectStore::new(&path);
        let mine = SavedRectEntry::new(Rect::new(5, 5, 205, 205), colors(true, true, 2));
        store.set_entry(6, mine);
        store.save_preserving_existing().expect("save");

        let mut reloaded = SavedRectStore::new(&path);
        reloaded.load().expect("load");
        assert_eq!(reloaded.entry(6), Some(&mine));
    }

    #[test]
    fn missing_file_is_an_error_but_store_stays_usable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        assert!(matches!(store.load(), Err(StoreError::Open { .. })));
        assert_eq!(valid_slots(&store).len(), 0);
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        store.set_entry(NUM_SAVED_RECTS, SavedRectEntry::default());
        assert_eq!(valid_slots(&store).len(), 0);
        assert!(!store.is_valid(NUM_SAVED_RECTS));
        assert_eq!(store.entry(42), None);
    }

    #[test]
    fn cycling_skips_empty_slots_and_slot_zero() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = store_in(&dir);
        assert_eq!(store.next_valid_slot(1), None);

        store.set_entry(0, SavedRectEntry::default());
        assert_eq!(store.next_valid_slot(1), None);

        store.set_entry(3, SavedRectEntry::default());
        store.set_entry(7, SavedRectEntry::default());
        assert_eq!(store.next_valid_slot(1), Some(3));
        assert_eq!(store.next_valid_slot(3), Some(7));
        assert_eq!(store.next_valid_slot(7), Some(3));
        // A lone valid slot cycles back onto itself
        store = store_in(&dir);
        store.set_entry(5, SavedRectEntry::default());
        assert_eq!(store.next_valid_slot(5), Some(5));
    }
}
