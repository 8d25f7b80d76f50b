use serde::Serialize;

const DEFAULT_VIDEOS: &[(&str, &str)] = &[
    ("Video 1", "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=74s&pp=ygUXbmV2ZXIgZ29ubmEgZ2l2ZSB5b3UgdXA%3D"),
    ("Video 2", "https://www.youtube.com/watch?v=tJuJ0Dls1hI&ab_channel=%E9%88%BE%E9%88%A6%E4%BA%BA%E6%AF%92%E6%B0%A3%E9%81%8E%E5%BA%A6%E9%9C%80%E8%A6%81"),
    ("Video 3", "https://www.youtube.com/watch?v=shRV-LIbsO8&ab_channel=GundamInfo"),
    ("Video 4", "https://www.youtube.com/watch?v=CnUIs6aLjic&ab_channel=GundamInfo"),
    ("Video 5", "https://www.youtube.com/watch?v=CI41ouIbu2I&ab_channel=GundamInfo"),
    ("Video 6", "https://www.youtube.com/watch?v=7HZfuTxBhV8&ab_channel=GundamInfo"),
    ("Video 7", "https://www.youtube.com/watch?v=Yqr9OIgcrrA&pp=ygUPb25seSBteSByYWlsZ3Vu"),
    ("Video 8", "https://www.youtube.com/watch?v=08yTIIdyUpc&t=206s"),
    ("Video 9", "https://www.youtube.com/watch?v=FDd4jekq93A&ab_channel=VelikiyKutere"),
    ("Video 10", "https://www.youtube.com/watch?v=mdSXKdnLX9I&pp=ygUP57SF6JOu44Gu5byT55-i"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoEntry {
    pub label: String,
    pub url: String,
}

/// Read-only label → URL mapping behind the video picker
#[derive(Debug, Clone)]
pub struct MediaCatalog {
    entries: Vec<VideoEntry>,
}

impl MediaCatalog {
    pub fn new(entries: Vec<VideoEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VideoEntry] {
        &self.entries
    }

    pub fn url_for(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.url.as_str())
    }
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_VIDEOS
                .iter()
                .map(|(label, url)| VideoEntry {
                    label: label.to_string(),
                    url: url.to_string(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_order() {
        let catalog = MediaCatalog::default();
        let labels: Vec<&str> = catalog.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "Video 1");
        assert_eq!(labels[9], "Video 10");
    }

    #[test]
    fn test_url_lookup() {
        let catalog = MediaCatalog::default();
        assert!(catalog.url_for("Video 3").unwrap().contains("shRV-LIbsO8"));
        assert!(catalog.url_for("Video 11").is_none());
    }
}
