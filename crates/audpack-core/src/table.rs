//! The static dependency table.
//!
//! Built once at startup, never mutated. Order matters: the orchestrator
//! processes dependencies in exactly this sequence.

use crate::descriptor::Descriptor;

/// The full list of Audacity's external library dependencies.
pub fn dependency_table() -> Vec<Descriptor> {
    vec![
        Descriptor::new("zlib", "1.2.13"),
        Descriptor::new("libpng", "1.6.39"),
        Descriptor::new("expat", "2.5.0"),
        Descriptor::new("libjpeg-turbo", "2.1.5"),
        Descriptor::wxwidgets(),
        Descriptor::new("libmp3lame", "3.100"),
        Descriptor::new("mpg123", "1.31.2").with_options([("network", false)]),
        Descriptor::new("libid3tag", "0.15.2b").with_options([("shared", false)]),
        Descriptor::new("wavpack", "5.6.0"),
        Descriptor::new("ogg", "1.3.5"),
        Descriptor::new("flac", "1.4.2"),
        Descriptor::new("opus", "1.3.1"),
        Descriptor::new("vorbis", "1.3.7"),
        Descriptor::new("libsndfile", "1.0.31").with_options([("programs", false)]),
        Descriptor::new("vst3sdk", "3.7.7"),
        Descriptor::new("libuuid", "1.0.3"),
        Descriptor::portaudio(),
        Descriptor::new("portmidi", "r234"),
        Descriptor::new("threadpool", "20140926"),
        Descriptor::curl(),
        Descriptor::new("rapidjson", "1.1.0"),
        Descriptor::new("breakpad", "2023.01.27"),
        Descriptor::crashpad("cci.20220219-audacity"),
        Descriptor::new("catch2", "2.13.8"),
        Descriptor::qt6(),
        Descriptor::new("kddockwidgets", "1.6.0").with_channel("audacity/testing"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_unique_names() {
        let table = dependency_table();
        let mut names: Vec<_> = table.iter().map(Descriptor::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_table_order_and_specializations() {
        let table = dependency_table();
        assert_eq!(table.first().unwrap().name(), "zlib");
        assert_eq!(table.last().unwrap().name(), "kddockwidgets");

        // wxWidgets must be configured before the codec libraries it may
        // bundle are overridden by anything later; it sits right after them.
        let names: Vec<_> = table.iter().map(Descriptor::name).collect();
        assert_eq!(names[4], "wxwidgets");
        assert!(names.contains(&"qt"));
        assert!(names.contains(&"crashpad"));
    }

    #[test]
    fn test_table_references() {
        let table = dependency_table();
        let refs: Vec<_> = table.iter().map(Descriptor::reference).collect();
        assert!(refs.contains(&"zlib/1.2.13@audacity/stable".to_string()));
        assert!(refs.contains(&"portmidi/r234@audacity/stable".to_string()));
        assert!(refs.contains(&"qt/6.3.1@audacity/testing".to_string()));
        assert!(refs.contains(&"kddockwidgets/1.6.0@audacity/testing".to_string()));
    }

    #[test]
    fn test_nothing_enabled_by_default() {
        assert!(dependency_table().iter().all(|d| !d.default_enabled()));
    }
}
