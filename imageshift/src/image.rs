use core::fmt;

/// An image reference split into repository and tag on the first colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    repository: &'a str,
    tag: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    pub fn parse(image: &'a str) -> Self {
        match image.split_once(':') {
            Some((repository, tag)) => ImageRef {
                repository,
                tag: Some(tag),
            },
            None => ImageRef {
                repository: image,
                tag: None,
            },
        }
    }

    pub fn repository(&self) -> &'a str {
        self.repository
    }

    pub fn tag(&self) -> Option<&'a str> {
        self.tag
    }
}

impl fmt::Display for ImageRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "{}:{tag}", self.repository),
            None => write!(f, "{}", self.repository),
        }
    }
}

/// Rewrites `current` to `target`, keeping the existing tag if the target
/// does not carry one of its own.
pub fn rewrite(current: &str, target: &ImageRef<'_>) -> String {
    let current = ImageRef::parse(current);
    match (current.tag, target.tag) {
        (Some(tag), None) => format!("{}:{tag}", target.repository),
        _ => target.to_string(),
    }
}
