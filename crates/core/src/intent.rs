use crate::models::{ExperienceEntry, IntentKind, Profile};

pub const COMPANY_EXPERIENCE_SCORE: usize = 3;

/// "expreience" is a typo visitors actually send.
const EXPERIENCE_WORDS: &[&str] = &["experience", "expreience"];

const MIN_COMPANY_FRAGMENT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentRule {
    pub kind: IntentKind,
    pub keywords: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentScore {
    pub kind: IntentKind,
    pub score: usize,
}

/// Declaration order is the tie-break order.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule {
            kind: IntentKind::Standout,
            keywords: &[
                "unique",
                "stand out",
                "standout",
                "strength",
                "differentiator",
                "developer",
            ],
        },
        IntentRule {
            kind: IntentKind::CompanyExperience,
            keywords: &[],
        },
        IntentRule {
            kind: IntentKind::Education,
            keywords: &[
                "education",
                "school",
                "study",
                "degree",
                "college",
                "masters",
                "ms",
            ],
        },
        IntentRule {
            kind: IntentKind::Visa,
            keywords: &["visa", "authorization", "opt", "status", "sponsorship"],
        },
        IntentRule {
            kind: IntentKind::Summary,
            keywords: &["about", "summary", "introduce", "who are you"],
        },
        IntentRule {
            kind: IntentKind::Skills,
            keywords: &["skills", "stack", "tech", "tooling"],
        },
        IntentRule {
            kind: IntentKind::Joke,
            keywords: &["joke", "funny", "laugh", "lol"],
        },
        IntentRule {
            kind: IntentKind::Greeting,
            keywords: &["hi", "hello", "hey"],
        },
        // Projects, certifications and resume lose every tie to joke and greeting.
        IntentRule {
            kind: IntentKind::Projects,
            keywords: &["project", "portfolio", "built", "side"],
        },
        IntentRule {
            kind: IntentKind::Certifications,
            keywords: &["cert", "credential", "badge"],
        },
        IntentRule {
            kind: IntentKind::Resume,
            keywords: &["resume", "cv", "contact", "reach", "email", "linkedin", "hire"],
        },
    ]
}

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Counts keywords contained anywhere in `lower`. Substring containment, not word matching.
pub fn keyword_score(lower: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lower.contains(*keyword))
        .count()
}

pub fn company_fragments(company: &str) -> Vec<String> {
    company
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| word.chars().count() >= MIN_COMPANY_FRAGMENT_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Experience entry whose company best matches the query: most fragment hits,
/// then fewest unmatched fragments, then list order.
pub fn match_company<'a>(
    lower: &str,
    experience: &'a [ExperienceEntry],
) -> Option<&'a ExperienceEntry> {
    let mut best: Option<(&ExperienceEntry, usize, usize)> = None;
    for entry in experience {
        let fragments = company_fragments(&entry.company);
        let hits = fragments
            .iter()
            .filter(|fragment| lower.contains(fragment.as_str()))
            .count();
        if hits == 0 {
            continue;
        }
        let missed = fragments.len() - hits;
        match best {
            Some((_, best_hits, best_missed))
                if best_hits > hits || (best_hits == hits && best_missed <= missed) => {}
            _ => best = Some((entry, hits, missed)),
        }
    }
    best.map(|(entry, _, _)| entry)
}

pub fn mentions_experience(lower: &str) -> bool {
    keyword_score(lower, EXPERIENCE_WORDS) > 0
}

fn company_experience_score(lower: &str, profile: &Profile) -> usize {
    if mentions_experience(lower) && match_company(lower, &profile.experience).is_some() {
        COMPANY_EXPERIENCE_SCORE
    } else {
        0
    }
}

pub fn score_rule(rule: &IntentRule, lower: &str, profile: &Profile) -> usize {
    match rule.kind {
        IntentKind::CompanyExperience => company_experience_score(lower, profile),
        _ => keyword_score(lower, rule.keywords),
    }
}

/// Scores every rule against an already lower-cased query, in declaration order.
pub fn score_intents(rules: &[IntentRule], lower: &str, profile: &Profile) -> Vec<IntentScore> {
    rules
        .iter()
        .map(|rule| IntentScore {
            kind: rule.kind,
            score: score_rule(rule, lower, profile),
        })
        .collect()
}

/// Highest scoring rule, earliest declaration winning ties. `None` when nothing scored.
pub fn select_intent(scores: &[IntentScore]) -> Option<IntentScore> {
    let mut best: Option<IntentScore> = None;
    for candidate in scores {
        if candidate.score == 0 {
            continue;
        }
        match best {
            Some(current) if current.score >= candidate.score => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

pub fn classify_intent(text: &str, profile: &Profile) -> Option<IntentScore> {
    let lower = text.to_lowercase();
    select_intent(&score_intents(&default_rules(), &lower, profile))
}
