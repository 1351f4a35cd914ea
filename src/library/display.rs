use crate::config::TrackDisplayField;

use super::model::Song;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl Song {
    /// Build a display string according to the provided `fields` and separator.
    ///
    /// Fields are composed in the configured order; blank values are skipped and
    /// the title is used when nothing else was produced.
    pub fn display(&self, fields: &[TrackDisplayField], sep: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let title = non_blank(Some(&self.title));
        let artist = non_blank(self.artist_name.as_deref());

        for f in fields {
            match f {
                TrackDisplayField::Display => {
                    parts.extend(artist);
                    parts.extend(title);
                }
                TrackDisplayField::Title => parts.extend(title),
                TrackDisplayField::Artist => parts.extend(artist),
                TrackDisplayField::Album => parts.extend(non_blank(self.album_name.as_deref())),
                TrackDisplayField::Filename => {
                    let stem = self
                        .filename
                        .rsplit_once('.')
                        .map_or(self.filename.as_str(), |(stem, _)| stem);
                    parts.extend(non_blank(Some(stem)));
                }
                TrackDisplayField::Path => parts.push(&self.path),
            }
        }

        if parts.is_empty() {
            self.title.clone()
        } else {
            parts.join(sep)
        }
    }
}
