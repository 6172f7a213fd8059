use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEntryKind {
    Parent,
    Folder,
    Track,
}

#[derive(Debug, Clone)]
pub struct PickerEntry {
    pub kind: PickerEntryKind,
    pub path: PathBuf,
    pub label: String,
}

/// Outcome of activating the selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    Navigated,
    Picked(PathBuf),
    Nothing,
}

/// One-directory-at-a-time file browser restricted to audio files. Enter on
/// a file selects it; `audio_files()` returns everything selectable in the
/// current directory for the select-all command.
#[derive(Debug)]
pub struct FilePicker {
    dir: PathBuf,
    entries: Vec<PickerEntry>,
    pub selected: usize,
}

impl FilePicker {
    pub fn new(start_dir: PathBuf) -> Self {
        let mut picker = Self {
            dir: start_dir,
            entries: Vec::new(),
            selected: 0,
        };
        picker.refresh();
        picker
    }

    pub fn current_dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.entries.len() - 1);
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn activate_selected(&mut self) -> PickerAction {
        let Some(entry) = self.entries.get(self.selected).cloned() else {
            return PickerAction::Nothing;
        };

        match entry.kind {
            PickerEntryKind::Parent | PickerEntryKind::Folder => {
                self.dir = entry.path;
                self.selected = 0;
                self.refresh();
                PickerAction::Navigated
            }
            PickerEntryKind::Track => PickerAction::Picked(entry.path),
        }
    }

    /// All audio files in the current directory, in display order.
    pub fn audio_files(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == PickerEntryKind::Track)
            .map(|entry| entry.path.clone())
            .collect()
    }

    pub fn refresh(&mut self) {
        let mut entries = Vec::new();

        if let Some(parent) = self.dir.parent() {
            entries.push(PickerEntry {
                kind: PickerEntryKind::Parent,
                path: parent.to_path_buf(),
                label: String::from("[..] Up"),
            });
        }

        if let Ok(read_dir) = fs::read_dir(&self.dir) {
            let mut folders = Vec::new();
            let mut files = Vec::new();

            for entry in read_dir.filter_map(Result::ok) {
                let path = entry.path();
                let file_name = entry.file_name().to_string_lossy().to_string();

                if entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false) {
                    folders.push(PickerEntry {
                        kind: PickerEntryKind::Folder,
                        path,
                        label: format!("[DIR] {file_name}"),
                    });
                } else if is_audio_file(&path) {
                    files.push(PickerEntry {
                        kind: PickerEntryKind::Track,
                        path,
                        label: file_name,
                    });
                }
            }

            folders.sort_by_cached_key(|entry| entry.label.to_ascii_lowercase());
            files.sort_by_cached_key(|entry| entry.label.to_ascii_lowercase());
            entries.extend(folders);
            entries.extend(files);
        }

        self.entries = entries;
        if self.entries.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.entries.len() - 1);
        }
    }
}

fn is_audio_file(path: &Path) -> bool {
    const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").expect("fixture file");
    }

    #[test]
    fn lists_only_audio_files_and_folders() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("song.mp3"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("albums")).expect("subdir");

        let picker = FilePicker::new(dir.path().to_path_buf());
        let labels: Vec<&str> = picker
            .entries()
            .iter()
            .map(|entry| entry.label.as_str())
            .collect();

        assert!(labels.contains(&"[..] Up"));
        assert!(labels.contains(&"[DIR] albums"));
        assert!(labels.contains(&"song.mp3"));
        assert!(!labels.iter().any(|label| label.contains("notes.txt")));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_audio_file(Path::new("a.FLAC")));
        assert!(is_audio_file(Path::new("b.Mp3")));
        assert!(!is_audio_file(Path::new("c.pdf")));
        assert!(!is_audio_file(Path::new("noext")));
    }

    #[test]
    fn activating_folder_navigates_into_it() {
        let dir = tempdir().expect("tempdir");
        let sub = dir.path().join("albums");
        fs::create_dir(&sub).expect("subdir");
        touch(&sub.join("inner.wav"));

        let mut picker = FilePicker::new(dir.path().to_path_buf());
        let folder_pos = picker
            .entries()
            .iter()
            .position(|entry| entry.kind == PickerEntryKind::Folder)
            .expect("folder entry");
        picker.selected = folder_pos;

        assert_eq!(picker.activate_selected(), PickerAction::Navigated);
        assert_eq!(picker.current_dir(), sub.as_path());
        assert_eq!(picker.audio_files(), vec![sub.join("inner.wav")]);
    }

    #[test]
    fn activating_track_picks_it() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("song.ogg"));

        let mut picker = FilePicker::new(dir.path().to_path_buf());
        let track_pos = picker
            .entries()
            .iter()
            .position(|entry| entry.kind == PickerEntryKind::Track)
            .expect("track entry");
        picker.selected = track_pos;

        assert_eq!(
            picker.activate_selected(),
            PickerAction::Picked(dir.path().join("song.ogg"))
        );
    }

    #[test]
    fn audio_files_come_back_in_display_order() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("b.mp3"));
        touch(&dir.path().join("A.mp3"));
        touch(&dir.path().join("c.wav"));

        let picker = FilePicker::new(dir.path().to_path_buf());
        let names: Vec<String> = picker
            .audio_files()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["A.mp3", "b.mp3", "c.wav"]);
    }
}
