//! Prompt text sent with each request.

use serde_json::{Value, json};

use crate::domain::{ChatContext, Department};

pub(super) const TRANSCRIPTION_PROMPT: &str = "Transcribe the following audio precisely. \
If the speaker uses a language other than English, transcribe it in that language. \
Output only the transcription text without any commentary or markers.";

pub(super) const GEOCODE_PROMPT: &str = "Provide the precise street address, neighbourhood, \
and the nearest major municipal landmark for these coordinates. Be as specific as possible.";

fn department_labels() -> String {
    Department::ALL
        .iter()
        .map(|department| department.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn classification_prompt() -> String {
    format!(
        "Analyse this image of a municipal or civic issue.\n\
         1. Identify the specific issue.\n\
         2. Suggest a concise, professional title.\n\
         3. Provide a brief two-sentence description of what is happening.\n\
         4. Classify it into exactly one of these categories: {labels}.\n\
         5. Provide a specific issueType (for example Pothole, Fallen Tree, Graffiti, \
         Overflowing Bin).\n\
         Return JSON with the keys title, description, category and issueType.",
        labels = department_labels()
    )
}

/// Schema the classification response must follow.
pub(super) fn classification_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "category": { "type": "STRING" },
            "issueType": { "type": "STRING" }
        },
        "required": ["title", "description", "category", "issueType"],
        "propertyOrdering": ["title", "description", "category", "issueType"]
    })
}

pub(super) fn chat_system_prompt(context: &ChatContext) -> String {
    let user = &context.user;
    let reports = context
        .reports
        .iter()
        .map(|report| {
            format!(
                "- {} (Status: {}, Category: {}, ID: {})",
                report.title(),
                report.status().as_str(),
                report.category().label(),
                report.id()
            )
        })
        .collect::<Vec<_>>();
    let reports = if reports.is_empty() {
        "No reports submitted yet.".to_owned()
    } else {
        reports.join("\n")
    };

    format!(
        "You are 'Civic Buddy', the personal assistant of a municipal issue reporting service.\n\
         You are helping {name} (Level {level} citizen, {points} points).\n\n\
         PROFILE:\n\
         - Name: {name}\n\
         - Level: {level}\n\
         - Total points: {points}\n\
         - City rank: #{rank}\n\
         - Badges earned: {badges}\n\n\
         SUBMITTED REPORTS:\n{reports}\n\n\
         INSTRUCTIONS:\n\
         1. When asked about \"my reports\", refer to the reports listed above.\n\
         2. For questions about nearby facilities, use the Google Maps tool.\n\
         3. Keep answers concise.\n\
         4. When Google Maps results are used, list the links they provide.",
        name = user.name(),
        level = user.level(),
        points = user.points(),
        rank = user.city_rank(),
        badges = user.earned_badge_ids().len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User, UserId};
    use crate::test_support::persisted_report;
    use crate::domain::ReportStatus;

    fn context(with_report: bool) -> ChatContext {
        let id = UserId::for_email("prompt@example.org");
        let reports = if with_report {
            vec![persisted_report(&id, 9, ReportStatus::InProgress)]
        } else {
            Vec::new()
        };
        ChatContext {
            user: User::new(id, "Asha Rao", "prompt@example.org", Role::Citizen, None),
            reports,
        }
    }

    #[test]
    fn classification_prompt_lists_every_department() {
        let prompt = classification_prompt();
        for department in Department::ALL {
            assert!(prompt.contains(department.label()), "{department} missing");
        }
    }

    #[test]
    fn chat_prompt_summarises_reports() {
        let prompt = chat_system_prompt(&context(true));
        assert!(prompt.contains("Asha Rao"));
        assert!(prompt.contains("- Issue 9 (Status: IN_PROGRESS, Category: Roads & Infrastructure"));
    }

    #[test]
    fn chat_prompt_notes_missing_reports() {
        assert!(chat_system_prompt(&context(false)).contains("No reports submitted yet."));
    }
}
