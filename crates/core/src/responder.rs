use std::sync::Arc;

use rand::{rng, Rng};

use crate::intent::{default_rules, match_company, score_intents, select_intent, IntentRule};
use crate::models::{IntentKind, Profile, Resolution};

pub const FALLBACK_REPLY: &str = "Great question — I'll get back to you on that. For now I can answer education, visa status, summary, skills, projects, certifications, resume, or tell a joke.";

pub const GREETING_REPLY: &str = "Hey! I'm Sparkie. Ask about education, visa status, summary, skills — or say \"tell me a joke\".";

pub const JOKES: &[&str] = &[
    "Why did the data engineer break up with CSV? Too many commas in the relationship.",
    "I tried to start a query club, but nobody had the right join.",
    "Our pipeline is like coffee: it fails without proper grounds.",
];

/// Source of the joke index. Injected so callers can pin the pick.
pub trait RandomSource: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        (rng().next_u64() % len as u64) as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub usize);

impl RandomSource for FixedRandom {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

#[derive(Clone)]
pub struct Responder {
    profile: Arc<Profile>,
    rules: Vec<IntentRule>,
    random: Arc<dyn RandomSource>,
}

impl Responder {
    pub fn new(profile: Arc<Profile>) -> Self {
        Self {
            profile,
            rules: default_rules(),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn shared_profile(&self) -> Arc<Profile> {
        self.profile.clone()
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn respond(&self, query: &str) -> String {
        self.resolve(query).text
    }

    pub fn resolve(&self, query: &str) -> Resolution {
        let lower = query.to_lowercase();
        let scores = score_intents(&self.rules, &lower, &self.profile);

        let Some(best) = select_intent(&scores) else {
            return fallback();
        };

        match self
            .produce(best.kind, &lower)
            .filter(|text| !text.trim().is_empty())
        {
            Some(text) => Resolution {
                intent: Some(best.kind),
                score: best.score,
                text,
            },
            None => fallback(),
        }
    }

    fn produce(&self, kind: IntentKind, lower: &str) -> Option<String> {
        let profile = &*self.profile;
        match kind {
            IntentKind::Standout => bulleted("Here's what makes me unique:", &profile.highlights),
            IntentKind::CompanyExperience => {
                let entry = match_company(lower, &profile.experience)?;
                let mut lines = vec![entry.headline()];
                lines.extend(entry.bullets.iter().map(|bullet| format!("• {bullet}")));
                Some(lines.join("\n"))
            }
            IntentKind::Education => {
                let items = profile
                    .education
                    .iter()
                    .map(|entry| {
                        format!("{} — {} ({})", entry.school, entry.degree, entry.time_range)
                    })
                    .collect::<Vec<_>>();
                bulleted("Here's my education:", &items)
            }
            IntentKind::Visa => Some(profile.work_authorization.clone()),
            IntentKind::Summary => Some(profile.summary.clone()),
            IntentKind::Skills => {
                non_empty(&profile.skills).map(|skills| format!("Core skills: {skills}"))
            }
            IntentKind::Projects => {
                let items = profile
                    .projects
                    .iter()
                    .map(|project| match project.repo.as_deref() {
                        Some(repo) => format!(
                            "{} ({}): {}. Repo: {}",
                            project.name, project.time, project.stack, repo
                        ),
                        None => format!("{} ({}): {}", project.name, project.time, project.stack),
                    })
                    .collect::<Vec<_>>();
                bulleted("Projects:", &items)
            }
            IntentKind::Certifications => {
                let items = profile
                    .certs
                    .iter()
                    .map(|cert| match cert.link.as_deref() {
                        Some(link) => format!("{} — verify at {}", cert.name, link),
                        None => cert.name.clone(),
                    })
                    .collect::<Vec<_>>();
                bulleted("Certifications:", &items)
            }
            IntentKind::Resume => contact_reply(profile),
            IntentKind::Joke => {
                let idx = self.random.pick(JOKES.len());
                JOKES.get(idx).map(|joke| joke.to_string())
            }
            IntentKind::Greeting => Some(GREETING_REPLY.to_string()),
        }
    }
}

fn fallback() -> Resolution {
    Resolution {
        intent: None,
        score: 0,
        text: FALLBACK_REPLY.to_string(),
    }
}

fn contact_reply(profile: &Profile) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(resume) = profile.link("resume") {
        lines.push(format!("You can grab my resume at {resume}"));
    }
    if let Some(linkedin) = profile.link("linkedin") {
        lines.push(format!("Connect with me on LinkedIn: {linkedin}"));
    }
    if let Some(github) = profile.link("github") {
        lines.push(format!("Code lives at {github}"));
    }
    if let Some(email) = profile.link("email") {
        lines.push(format!("Or email me at {email}"));
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn bulleted(header: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut lines = vec![header.to_string()];
    lines.extend(items.iter().map(|item| format!("• {item}")));
    Some(lines.join("\n"))
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
