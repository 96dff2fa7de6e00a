// src/prompt/builder.rs
// Assembles the system instruction, injecting the team skills directory.

use chrono::Utc;
use tracing::{debug, warn};

use crate::teams::{MemberSkills, TeamDirectory};

const SKILLS_UNAVAILABLE: &str = "[Could not load team skills data.]";

/// Builds the complete system prompt for a request. Never fails: a skills
/// lookup problem degrades to a fixed marker instead of poisoning the call.
pub async fn build_system_prompt(
    directory: &dyn TeamDirectory,
    team_id: Option<&str>,
    user_id: Option<&str>,
    user_email: Option<&str>,
) -> String {
    let current_date = Utc::now().format("%Y-%m-%d");
    debug!(?team_id, ?user_id, ?user_email, "building system prompt");

    let mut prompt = format!(
        "You are the Teamchat assistant, a large language model embedded in a team \
         workspace. Strictly follow the user's instructions. Current date: {current_date}"
    );

    prompt.push_str(
        "\n\n--- CRITICAL CONTEXT: TEAM SKILLS ---\n\
         You are an AI assistant for a specific team. Below is a list of your team \
         members and their skills. BEFORE answering any query about skills, \
         programming, tools, or learning a topic, check this list first. If the \
         query matches a listed skill, identify the team member(s) who have that \
         skill and suggest the user approach them. Only give general advice when no \
         team member has the skill.\n\n",
    );

    let skills_block = match skills_for(directory, team_id).await {
        Ok(members) => render_skills_block(&members),
        Err(reason) => {
            warn!("team skills unavailable for prompt: {reason}");
            SKILLS_UNAVAILABLE.to_string()
        }
    };
    prompt.push_str(&skills_block);
    prompt
}

async fn skills_for(
    directory: &dyn TeamDirectory,
    team_id: Option<&str>,
) -> Result<Vec<MemberSkills>, String> {
    let raw = team_id.ok_or_else(|| "no team id on request".to_string())?;
    let team_id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid team id '{raw}'"))?;
    directory
        .team_skills(team_id)
        .await
        .map_err(|e| e.to_string())
}

/// Renders the per-member skills list shown to the model.
pub fn render_skills_block(members: &[MemberSkills]) -> String {
    let mut block = String::from("--- Team Skills List ---\n");
    for member in members {
        block.push_str(&format!("User: {}\n", member.user_email));
        if !member.soft.is_empty() {
            block.push_str(&format!("  Soft Skills: {}\n", member.soft.join(", ")));
        }
        if member.hard.is_empty() {
            block.push_str("  Hard Skills: None listed\n");
        } else {
            let mut categories = Vec::new();
            if !member.hard.programming.is_empty() {
                categories.push(format!(
                    "Programming: {}",
                    member.hard.programming.join(", ")
                ));
            }
            if !member.hard.tools.is_empty() {
                categories.push(format!("Tools: {}", member.hard.tools.join(", ")));
            }
            block.push_str(&format!("  Hard Skills: {}\n", categories.join("; ")));
        }
        block.push('\n');
    }
    block.push_str("--- End of Team Skills List ---\n");
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::{HardSkills, MemoryTeamDirectory};

    fn member(email: &str, soft: &[&str], programming: &[&str], tools: &[&str]) -> MemberSkills {
        MemberSkills {
            user_key: email.to_string(),
            user_email: email.to_string(),
            soft: soft.iter().map(|s| s.to_string()).collect(),
            hard: HardSkills {
                programming: programming.iter().map(|s| s.to_string()).collect(),
                tools: tools.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[test]
    fn renders_hard_skill_categories() {
        let block = render_skills_block(&[member(
            "dev@x.com",
            &["mentoring"],
            &["Rust", "Go"],
            &["Docker"],
        )]);
        assert!(block.contains("User: dev@x.com"));
        assert!(block.contains("Soft Skills: mentoring"));
        assert!(block.contains("Hard Skills: Programming: Rust, Go; Tools: Docker"));
    }

    #[test]
    fn members_without_hard_skills_get_explicit_marker() {
        let block = render_skills_block(&[member("ops@x.com", &[], &[], &[])]);
        assert!(block.contains("Hard Skills: None listed"));
        assert!(!block.contains("Soft Skills:"));
    }

    #[tokio::test]
    async fn prompt_includes_member_skills() {
        let directory = MemoryTeamDirectory::new();
        let team = directory.create_team("Platform", None).await.unwrap();
        directory
            .add_member(team.team_id, "u1", "dev@x.com")
            .await
            .unwrap();
        directory.set_member_skills(
            team.team_id,
            "u1",
            vec!["mentoring".into()],
            HardSkills {
                programming: vec!["Rust".into()],
                tools: vec![],
            },
        );

        let team_id = team.team_id.to_string();
        let prompt =
            build_system_prompt(&directory, Some(&team_id), Some("u1"), Some("dev@x.com")).await;
        assert!(prompt.contains("Current date:"));
        assert!(prompt.contains("dev@x.com"));
        assert!(prompt.contains("Programming: Rust"));
    }

    #[tokio::test]
    async fn prompt_degrades_when_skills_unavailable() {
        let directory = MemoryTeamDirectory::new();

        // Unknown team
        let prompt = build_system_prompt(&directory, Some("999"), None, None).await;
        assert!(prompt.contains(SKILLS_UNAVAILABLE));

        // Missing team header
        let prompt = build_system_prompt(&directory, None, None, None).await;
        assert!(prompt.contains(SKILLS_UNAVAILABLE));

        // Unparseable team header
        let prompt = build_system_prompt(&directory, Some("not-a-number"), None, None).await;
        assert!(prompt.contains(SKILLS_UNAVAILABLE));
    }
}
