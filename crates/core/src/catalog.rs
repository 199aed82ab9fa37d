//! Catalog model - the read-only projects and showcases a visitor browses.
//!
//! The catalog is reference data. Progress tracking only ever needs its size
//! and the ids of its projects.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use crate::id::ItemId;

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Malformed catalog JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two projects share an id
    #[error("duplicate project id: {0}")]
    DuplicateId(ItemId),

    /// Difficulty outside 1..=5
    #[error("project {id} has difficulty {difficulty}, expected 1-5")]
    InvalidDifficulty {
        /// Offending project
        id: ItemId,
        /// Value found
        difficulty: u8,
    },
}

/// Project category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Entry-level projects
    Basic,
    /// Intermediate projects
    Intermediate,
    /// Advanced projects
    Advanced,
}

impl Category {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Basic => "basic",
            Category::Intermediate => "intermediate",
            Category::Advanced => "advanced",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Category::Basic),
            "intermediate" => Ok(Category::Intermediate),
            "advanced" => Ok(Category::Advanced),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// How much ready-to-run code a project comes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeAvailability {
    /// Full source available
    Complete,
    /// Parts of the source available
    Partial,
    /// Tutorial-style walkthrough
    Tutorial,
    /// Little or no code
    Minimal,
}

/// A named link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Display name
    pub name: String,
    /// Target URL
    pub url: String,
}

/// A code example linked from a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    /// Display name
    pub name: String,
    /// Target URL
    pub url: String,
    /// What the example shows
    #[serde(default)]
    pub description: String,
}

/// A curated learning project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Stable id, also the progress key
    pub id: ItemId,

    /// Title
    pub title: String,

    /// Short description
    pub description: String,

    /// Category
    pub category: Category,

    /// Difficulty, 1 (easiest) to 5
    pub difficulty: u8,

    /// Expected duration, free text
    #[serde(default)]
    pub duration: String,

    /// Tags used by the tag filter and search
    #[serde(default)]
    pub tags: Vec<String>,

    /// Key points covered
    #[serde(default)]
    pub key_points: Vec<String>,

    /// What the learner gains
    #[serde(default)]
    pub learning_value: Vec<String>,

    /// Reading material
    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Optional icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Share of runnable code available, 0-100
    #[serde(default)]
    pub code_availability: u8,

    /// Label for `code_availability`
    #[serde(default = "default_code_availability_label")]
    pub code_availability_label: CodeAvailability,

    /// Linked code examples
    #[serde(default)]
    pub code_examples: Vec<CodeExample>,
}

fn default_code_availability_label() -> CodeAvailability {
    CodeAvailability::Minimal
}

/// Kind of project a showcase was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowcaseType {
    /// Built from a basic project
    Basic,
    /// Built from an advanced project
    Advanced,
    /// Expert-level work
    Expert,
}

/// A comment on a showcase. Comments are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id
    pub id: String,
    /// Author name
    pub author: String,
    /// Optional avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    /// Body text
    pub content: String,
    /// Date, free text
    pub date: String,
    /// Like count
    #[serde(default)]
    pub likes: u32,
    /// Nested replies
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// This comment plus all nested replies.
    pub fn thread_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::thread_len).sum::<usize>()
    }
}

/// A community-submitted showcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showcase {
    /// Stable id
    pub id: ItemId,
    /// Title
    pub title: String,
    /// Short description
    pub description: String,
    /// Long-form body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    /// Author name
    pub author: String,
    /// Kind of project
    pub project_type: ShowcaseType,
    /// Technologies used
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Demo link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
    /// Source link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    /// Date, free text
    pub date: String,
    /// Like count
    #[serde(default)]
    pub likes: u32,
    /// View count
    #[serde(default)]
    pub views: u32,
    /// Comments
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Highlighted in the gallery
    #[serde(default)]
    pub featured: bool,
}

impl Showcase {
    /// Total number of comments including replies.
    pub fn comment_count(&self) -> usize {
        self.comments.iter().map(Comment::thread_len).sum()
    }
}

/// Projects and showcases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Learning projects
    #[serde(default)]
    pub projects: Vec<Project>,

    /// Community showcases
    #[serde(default)]
    pub showcases: Vec<Showcase>,
}

impl Catalog {
    /// Parse and validate a catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for project in &self.projects {
            if !seen.insert(&project.id) {
                return Err(CatalogError::DuplicateId(project.id.clone()));
            }
            if !(1..=5).contains(&project.difficulty) {
                return Err(CatalogError::InvalidDifficulty {
                    id: project.id.clone(),
                    difficulty: project.difficulty,
                });
            }
        }
        Ok(())
    }

    /// Number of trackable projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the catalog has no projects.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Project by id.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id.as_str() == id)
    }

    /// Every tag used by any project, sorted and de-duplicated.
    pub fn all_tags(&self) -> Vec<&str> {
        self.projects
            .iter()
            .flat_map(|p| p.tags.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Showcases flagged as featured.
    pub fn featured_showcases(&self) -> impl Iterator<Item = &Showcase> + '_ {
        self.showcases.iter().filter(|s| s.featured)
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Ascending difficulty; ties keep catalog order
    #[default]
    Difficulty,
    /// Catalog order
    None,
}

/// Filter/search/sort over projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    /// Only this category
    pub category: Option<Category>,
    /// Only projects carrying this exact tag
    pub tag: Option<String>,
    /// Case-insensitive substring of title, description or any tag
    pub search: Option<String>,
    /// Ordering
    pub sort: SortBy,
}

impl ProjectQuery {
    /// Run the query.
    pub fn apply<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<&Project> = projects
            .iter()
            .filter(|p| self.category.map_or(true, |c| p.category == c))
            .filter(|p| {
                self.tag
                    .as_deref()
                    .map_or(true, |tag| p.tags.iter().any(|t| t == tag))
            })
            .filter(|p| match &needle {
                Some(q) => {
                    p.title.to_lowercase().contains(q.as_str())
                        || p.description.to_lowercase().contains(q.as_str())
                        || p.tags.iter().any(|t| t.to_lowercase().contains(q.as_str()))
                }
                None => true,
            })
            .collect();

        if self.sort == SortBy::Difficulty {
            matched.sort_by_key(|p| p.difficulty);
        }
        matched
    }
}
