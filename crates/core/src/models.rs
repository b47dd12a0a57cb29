use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub summary: String,
    pub skills: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub work_authorization: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub certs: Vec<Certification>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl Profile {
    pub fn link(&self, key: &str) -> Option<&str> {
        self.links
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceType {
    Internship,
    Fulltime,
    Freelance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    #[serde(default, rename = "type")]
    pub kind: Option<ExperienceType>,
    pub time_range: String,
    pub location: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExperienceEntry {
    pub fn headline(&self) -> String {
        format!(
            "{} — {} ({}, {})",
            self.company, self.role, self.time_range, self.location
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub stack: String,
    pub time: String,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub time_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Standout,
    CompanyExperience,
    Education,
    Visa,
    Summary,
    Skills,
    Projects,
    Certifications,
    Resume,
    Joke,
    Greeting,
}

impl IntentKind {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Standout => "standout",
            Self::CompanyExperience => "company_experience",
            Self::Education => "education",
            Self::Visa => "visa",
            Self::Summary => "summary",
            Self::Skills => "skills",
            Self::Projects => "projects",
            Self::Certifications => "certifications",
            Self::Resume => "resume",
            Self::Joke => "joke",
            Self::Greeting => "greeting",
        }
    }
}

/// Outcome of one responder call. `intent` is `None` when the fallback reply was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub intent: Option<IntentKind>,
    pub score: usize,
    pub text: String,
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        self.intent.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderHint {
    Typewriter,
    Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub render: RenderHint,
    pub at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            render: RenderHint::Instant,
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            render: crate::render::render_hint(&text),
            text,
            at: Utc::now(),
        }
    }
}
