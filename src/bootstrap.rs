//! Seed routines shared by the maintenance endpoints and the maintenance
//! binary. Every routine is idempotent so re-running a deploy hook is safe.

use anyhow::{Context, Result};
use diesel::{prelude::*, PgConnection};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::models::{NewAssessmentQuestion, NewAssessmentTemplate, NewUser};
use crate::schema::{assessment_questions, assessment_templates, candidate_profiles, users};
use crate::scoring::{KIND_FORCED_CHOICE, KIND_LIKERT, MODEL_BIG_FIVE, MODEL_DISC};

struct LikertSeed {
    prompt: &'static str,
    dimension: &'static str,
    reverse: bool,
}

const BIG_FIVE_SEED: &[LikertSeed] = &[
    LikertSeed {
        prompt: "I enjoy exploring ideas outside my area of expertise.",
        dimension: "openness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I prefer familiar routines over new experiences.",
        dimension: "openness",
        reverse: true,
    },
    LikertSeed {
        prompt: "I am curious about how things work.",
        dimension: "openness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I finish tasks well before their deadline.",
        dimension: "conscientiousness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I leave my workspace disorganized.",
        dimension: "conscientiousness",
        reverse: true,
    },
    LikertSeed {
        prompt: "I double-check my work for mistakes.",
        dimension: "conscientiousness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I feel energized after meeting new people.",
        dimension: "extraversion",
        reverse: false,
    },
    LikertSeed {
        prompt: "I prefer working alone to working in groups.",
        dimension: "extraversion",
        reverse: true,
    },
    LikertSeed {
        prompt: "I speak up readily in group discussions.",
        dimension: "extraversion",
        reverse: false,
    },
    LikertSeed {
        prompt: "I go out of my way to make others feel included.",
        dimension: "agreeableness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I put my own interests ahead of the team's.",
        dimension: "agreeableness",
        reverse: true,
    },
    LikertSeed {
        prompt: "Colleagues describe me as easy to work with.",
        dimension: "agreeableness",
        reverse: false,
    },
    LikertSeed {
        prompt: "I worry about things that might go wrong.",
        dimension: "neuroticism",
        reverse: false,
    },
    LikertSeed {
        prompt: "I stay calm under pressure.",
        dimension: "neuroticism",
        reverse: true,
    },
    LikertSeed {
        prompt: "Small setbacks affect my mood for a long time.",
        dimension: "neuroticism",
        reverse: false,
    },
];

struct ForcedChoiceSeed {
    prompt: &'static str,
    options: [(&'static str, &'static str); 4],
}

const DISC_SEED: &[ForcedChoiceSeed] = &[
    ForcedChoiceSeed {
        prompt: "In a new team I tend to...",
        options: [
            ("Take charge of the direction", "dominance"),
            ("Get everyone talking", "influence"),
            ("Keep the group steady", "steadiness"),
            ("Clarify the rules first", "conscientiousness"),
        ],
    },
    ForcedChoiceSeed {
        prompt: "Under a tight deadline I am the one who...",
        options: [
            ("Pushes for a decision", "dominance"),
            ("Rallies the team's energy", "influence"),
            ("Works through it patiently", "steadiness"),
            ("Checks nothing is missed", "conscientiousness"),
        ],
    },
    ForcedChoiceSeed {
        prompt: "When a plan changes at the last minute I...",
        options: [
            ("Redirect people immediately", "dominance"),
            ("Talk the team through it", "influence"),
            ("Absorb it without fuss", "steadiness"),
            ("Re-verify the new plan", "conscientiousness"),
        ],
    },
    ForcedChoiceSeed {
        prompt: "Colleagues come to me when they need someone to...",
        options: [
            ("Make the hard call", "dominance"),
            ("Win others over", "influence"),
            ("Listen and support", "steadiness"),
            ("Get the details right", "conscientiousness"),
        ],
    },
];

/// Creates the default personality assessment with its question bank.
/// Returns false without touching anything when a default already exists.
pub fn bootstrap_default_assessment(conn: &mut PgConnection) -> Result<bool> {
    let existing: i64 = assessment_templates::table
        .filter(assessment_templates::is_default.eq(true))
        .count()
        .get_result(conn)
        .context("checking for a default assessment")?;
    if existing > 0 {
        return Ok(false);
    }

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let template_id = Uuid::new_v4();
        diesel::insert_into(assessment_templates::table)
            .values(&NewAssessmentTemplate {
                id: template_id,
                name: "Personality Assessment".to_string(),
                description: "Big Five and DISC screening questionnaire".to_string(),
                is_default: true,
            })
            .execute(conn)?;

        let mut position = 1;
        for seed in BIG_FIVE_SEED {
            diesel::insert_into(assessment_questions::table)
                .values(&NewAssessmentQuestion {
                    id: Uuid::new_v4(),
                    template_id,
                    position,
                    prompt: seed.prompt.to_string(),
                    kind: KIND_LIKERT.to_string(),
                    trait_model: MODEL_BIG_FIVE.to_string(),
                    dimension: Some(seed.dimension.to_string()),
                    reverse: seed.reverse,
                    weight: 1.0,
                    options: json!([]),
                })
                .execute(conn)?;
            position += 1;
        }
        for seed in DISC_SEED {
            let options = json!(seed
                .options
                .iter()
                .map(|(label, dimension)| json!({ "label": label, "dimension": dimension }))
                .collect::<Vec<_>>());
            diesel::insert_into(assessment_questions::table)
                .values(&NewAssessmentQuestion {
                    id: Uuid::new_v4(),
                    template_id,
                    position,
                    prompt: seed.prompt.to_string(),
                    kind: KIND_FORCED_CHOICE.to_string(),
                    trait_model: MODEL_DISC.to_string(),
                    dimension: None,
                    reverse: false,
                    weight: 1.0,
                    options,
                })
                .execute(conn)?;
            position += 1;
        }
        Ok(())
    })?;

    info!("default assessment bootstrapped");
    Ok(true)
}

/// Creates a user with the given role if the username is free. Existing
/// users are left untouched, password included. Returns whether a row was
/// created.
pub fn seed_user(
    conn: &mut PgConnection,
    username: &str,
    password: &str,
    role: &str,
    full_name: &str,
) -> Result<bool> {
    let existing: i64 = users::table
        .filter(users::username.eq(username))
        .count()
        .get_result(conn)
        .context("checking for an existing user")?;
    if existing > 0 {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    let user_id = Uuid::new_v4();
    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::insert_into(users::table)
            .values(&NewUser {
                id: user_id,
                username: username.to_string(),
                password_hash,
                role: role.to_string(),
                full_name: full_name.to_string(),
            })
            .execute(conn)?;
        diesel::insert_into(candidate_profiles::table)
            .values(&crate::models::NewCandidateProfile { user_id })
            .execute(conn)?;
        Ok(())
    })?;

    info!(%username, %role, "user seeded");
    Ok(true)
}
