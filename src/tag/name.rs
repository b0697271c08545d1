use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::{PRODUCTION_PREFIX, STAGING_PREFIX};
use crate::error::CliError;

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(staging|production)-(\d{4}-\d{2}-\d{2})-(\d+)-(.+)$")
        .expect("tag grammar is a valid regex")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Deployment phase. Decides the tag namespace; promotion only goes staging -> production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Staging,
    Production,
}

impl Stage {
    pub fn prefix(&self) -> &'static str {
        match self {
            Stage::Staging => STAGING_PREFIX,
            Stage::Production => PRODUCTION_PREFIX,
        }
    }

    /// Glob matching every tag of this stage, e.g. `staging-*`.
    pub fn pattern(&self) -> String {
        format!("{}-*", self.prefix())
    }

    /// Glob matching every tag of this stage minted on `date`.
    pub fn pattern_for_date(&self, date: NaiveDate) -> String {
        format!("{}-{}-*", self.prefix(), date.format(DATE_FORMAT))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Stage {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            STAGING_PREFIX => Ok(Stage::Staging),
            PRODUCTION_PREFIX => Ok(Stage::Production),
            other => Err(CliError::UnsupportedStage(other.to_string())),
        }
    }
}

/// A release tag: `<stage>-<YYYY-MM-DD>-<serial>-<author>-<slug>`.
///
/// The author never contains a dash, so everything after the first dash of the
/// trailing part belongs to the slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTag {
    stage: Stage,
    date: NaiveDate,
    serial: u32,
    author: String,
    slug: String,
}

impl ReleaseTag {
    pub fn new(
        stage: Stage,
        date: NaiveDate,
        serial: u32,
        author: impl Into<String>,
        slug: impl Into<String>,
    ) -> Result<Self, CliError> {
        let tag = ReleaseTag {
            stage,
            date,
            serial,
            author: author.into(),
            slug: slug.into(),
        };
        tag.validate()?;
        Ok(tag)
    }

    pub fn parse(name: &str) -> Result<Self, CliError> {
        let caps = TAG_REGEX.captures(name).ok_or_else(|| {
            CliError::parse(
                name,
                "expected <stage>-<YYYY-MM-DD>-<serial>-<author>-<description>",
            )
        })?;

        let stage = Stage::from_str(&caps[1]).map_err(|e| CliError::parse(name, e.to_string()))?;
        let date = NaiveDate::parse_from_str(&caps[2], DATE_FORMAT)
            .map_err(|e| CliError::parse(name, format!("invalid date: {}", e)))?;
        let serial = caps[3]
            .parse::<u32>()
            .map_err(|e| CliError::parse(name, format!("invalid serial: {}", e)))?;
        let (author, slug) = caps[4]
            .split_once('-')
            .ok_or_else(|| CliError::parse(name, "missing description after author"))?;

        let tag = ReleaseTag {
            stage,
            date,
            serial,
            author: author.to_string(),
            slug: slug.to_string(),
        };
        tag.validate().map_err(|e| match e {
            CliError::Parse { reason, .. } => CliError::parse(name, reason),
            other => other,
        })?;
        Ok(tag)
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.serial == 0 {
            return Err(CliError::parse(&self.to_string(), "serial must be positive"));
        }
        if self.author.is_empty() || self.author.contains('-') {
            return Err(CliError::parse(
                &self.to_string(),
                "author must be a single non-empty token",
            ));
        }
        if self.slug.is_empty() {
            return Err(CliError::parse(&self.to_string(), "description is empty"));
        }
        Ok(())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The production tag mirroring this staging tag. Suffix is kept verbatim.
    pub fn promote(&self) -> Result<ReleaseTag, CliError> {
        if self.stage != Stage::Staging {
            return Err(CliError::NoStagingTag);
        }
        Ok(ReleaseTag {
            stage: Stage::Production,
            ..self.clone()
        })
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.stage,
            self.date.format(DATE_FORMAT),
            self.serial,
            self.author,
            self.slug
        )
    }
}

impl FromStr for ReleaseTag {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReleaseTag::parse(s)
    }
}

impl Serialize for ReleaseTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Serial for the next tag minted on `today`: one past the highest serial
/// already used that day, whatever commits those tags sit on.
pub fn next_serial<'a>(
    existing: impl IntoIterator<Item = &'a ReleaseTag>,
    today: NaiveDate,
) -> Result<u32, CliError> {
    let highest = existing
        .into_iter()
        .filter(|tag| tag.date() == today)
        .max_by_key(|tag| tag.serial());

    match highest {
        None => Ok(1),
        Some(tag) => tag
            .serial()
            .checked_add(1)
            .ok_or_else(|| CliError::parse(&tag.to_string(), "no serial left for this date")),
    }
}
