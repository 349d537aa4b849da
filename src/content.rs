use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::ContentError;

const SAMPLE_BOOK: &str = include_str!("../assets/sample_book.yaml");

/// An illustration referenced by a page. The pixel size is probed once when
/// the book is loaded from disk; it stays `None` when the file is missing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Illustration {
    pub source: PathBuf,
    pub size: Option<(usize, usize)>,
}

impl From<String> for Illustration {
    fn from(source: String) -> Self {
        Self {
            source: PathBuf::from(source),
            size: None,
        }
    }
}

impl Illustration {
    fn resolve(&mut self, base_dir: &Path) {
        if self.source.is_relative() {
            self.source = base_dir.join(&self.source);
        }
        match imagesize::size(&self.source) {
            Ok(size) => {
                debug!(
                    "Illustration {:?} size: {}x{}",
                    self.source, size.width, size.height
                );
                self.size = Some((size.width, size.height));
            }
            Err(e) => warn!("Failed to probe illustration {:?}: {e}", self.source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Page {
    Cover {
        image: Illustration,
        title: String,
        subtitle: String,
    },
    Dedication {
        image: Illustration,
        dedication: String,
        title: String,
        author: String,
        summary: String,
    },
    Chapter {
        image: Illustration,
        image_title: String,
        text: String,
    },
}

impl Page {
    pub fn kind(&self) -> &'static str {
        match self {
            Page::Cover { .. } => "cover",
            Page::Dedication { .. } => "dedication",
            Page::Chapter { .. } => "chapter",
        }
    }

    pub fn image(&self) -> &Illustration {
        match self {
            Page::Cover { image, .. }
            | Page::Dedication { image, .. }
            | Page::Chapter { image, .. } => image,
        }
    }

    fn image_mut(&mut self) -> &mut Illustration {
        match self {
            Page::Cover { image, .. }
            | Page::Dedication { image, .. }
            | Page::Chapter { image, .. } => image,
        }
    }

    /// First field (other than chapter text) where the two pages disagree.
    fn differing_field(&self, other: &Page) -> Option<&'static str> {
        if self.image() != other.image() {
            return Some("image");
        }
        match (self, other) {
            (
                Page::Cover {
                    title: t1,
                    subtitle: s1,
                    ..
                },
                Page::Cover {
                    title: t2,
                    subtitle: s2,
                    ..
                },
            ) => {
                if t1 != t2 {
                    Some("title")
                } else if s1 != s2 {
                    Some("subtitle")
                } else {
                    None
                }
            }
            (
                Page::Dedication {
                    dedication: d1,
                    title: t1,
                    author: a1,
                    summary: s1,
                    ..
                },
                Page::Dedication {
                    dedication: d2,
                    title: t2,
                    author: a2,
                    summary: s2,
                    ..
                },
            ) => [
                ("dedication", d1 == d2),
                ("title", t1 == t2),
                ("author", a1 == a2),
                ("summary", s1 == s2),
            ]
            .into_iter()
            .find(|(_, same)| !same)
            .map(|(field, _)| field),
            (
                Page::Chapter {
                    image_title: t1, ..
                },
                Page::Chapter {
                    image_title: t2, ..
                },
            ) => (t1 != t2).then_some("image_title"),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookFile {
    title: String,
    #[serde(default)]
    share_url: Option<String>,
    pages: Vec<Page>,
    annotated_pages: Vec<Page>,
}

/// The whole book in its two parallel variants. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct BookContent {
    title: String,
    share_url: Option<String>,
    plain: Vec<Page>,
    annotated: Vec<Page>,
}

impl BookContent {
    pub fn new(
        title: impl Into<String>,
        plain: Vec<Page>,
        annotated: Vec<Page>,
    ) -> Result<Self, ContentError> {
        if plain.is_empty() {
            return Err(ContentError::Empty);
        }
        if plain.len() != annotated.len() {
            return Err(ContentError::LengthMismatch {
                plain: plain.len(),
                annotated: annotated.len(),
            });
        }
        for (index, (p, a)) in plain.iter().zip(&annotated).enumerate() {
            if p.kind() != a.kind() {
                return Err(ContentError::KindMismatch {
                    page: index + 1,
                    plain: p.kind(),
                    annotated: a.kind(),
                });
            }
            if let Some(field) = p.differing_field(a) {
                return Err(ContentError::FieldMismatch {
                    page: index + 1,
                    field,
                });
            }
        }

        Ok(Self {
            title: title.into(),
            share_url: None,
            plain,
            annotated,
        })
    }

    pub fn with_share_url(mut self, share_url: Option<String>) -> Self {
        self.share_url = share_url;
        self
    }

    pub fn from_yaml(source: &str) -> Result<Self, ContentError> {
        let file: BookFile = serde_yaml::from_str(source)?;
        Ok(Self::new(file.title, file.pages, file.annotated_pages)?.with_share_url(file.share_url))
    }

    /// Load a book file; illustration paths are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let source = fs::read_to_string(path)?;
        let mut file: BookFile = serde_yaml::from_str(&source)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for page in file.pages.iter_mut().chain(file.annotated_pages.iter_mut()) {
            page.image_mut().resolve(base_dir);
        }

        let book = Self::new(file.title, file.pages, file.annotated_pages)?
            .with_share_url(file.share_url);
        info!("Loaded {:?} ({} pages) from {path:?}", book.title, book.len());
        Ok(book)
    }

    /// The book bundled with the binary.
    pub fn sample() -> Result<Self, ContentError> {
        Self::from_yaml(SAMPLE_BOOK)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }

    pub fn len(&self) -> usize {
        self.plain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.len() - 1
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.plain.get(index)
    }

    pub fn annotated_page(&self, index: usize) -> Option<&Page> {
        self.annotated.get(index)
    }

    /// Chapter text for `index` in the requested variant.
    pub fn chapter_text(&self, index: usize, annotated: bool) -> Option<&str> {
        let variant = if annotated {
            &self.annotated
        } else {
            &self.plain
        };
        match variant.get(index)? {
            Page::Chapter { text, .. } => Some(text),
            _ => None,
        }
    }
}
