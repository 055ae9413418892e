//! Construction des prompts envoyés au modèle

use crate::models::Role;

pub const DISCLAIMER: &str =
    "This is not medical advice. Please consult a qualified healthcare professional.";

pub const TRANSLATOR_SYSTEM: &str = "You are a professional medical translator. \
    Keep medical terms, drug names and dosages accurate. \
    Reply with the translation only, without any commentary.";

pub const ASSISTANT_SYSTEM: &str = "You are Arogya Mitra, an AI medical assistant for patients \
    and doctors in India. You never give a definitive diagnosis and you always recommend \
    seeing a doctor when symptoms are serious.";

pub const TRANSCRIBE: &str =
    "Transcribe this audio accurately. Reply with the transcription only.";

fn context_block(health_context: Option<&str>) -> String {
    match health_context {
        Some(context) if !context.trim().is_empty() => format!("\nPatient Context:\n{context}\n"),
        _ => String::new(),
    }
}

pub fn translation(text: &str, source_language: &str, target_language: &str) -> String {
    format!("Translate the following text from {source_language} to {target_language}.\n\n{text}")
}

pub fn symptom_analysis(
    symptoms: &str,
    language: &str,
    health_context: Option<&str>,
    role: Role,
) -> String {
    let audience = match role {
        Role::Doctor => "The reader is a doctor: use precise clinical terminology.",
        Role::Patient => "The reader is a patient: use simple, reassuring language.",
    };

    format!(
        "Language: {language}\n{audience}\n{context}\nSymptoms:\n{symptoms}\n\n\
         Respond ONLY with a JSON object with the fields:\n\
         - symptoms_summary (string)\n\
         - possible_conditions (list of strings)\n\
         - severity_level (one of Low, Medium, High, Critical)\n\
         - recommendations (list of strings)\n\
         - urgent_care_needed (true/false)\n\
         - follow_up_questions (list of strings)\n\
         - disclaimer (string)\n\
         Write every text value in {language}.",
        context = context_block(health_context),
    )
}

pub fn medical_chat(
    message: &str,
    language: &str,
    role: Role,
    health_context: Option<&str>,
    severity: Option<&str>,
) -> String {
    let severity = severity
        .map(|s| format!("\nLast assessed severity: {s}\n"))
        .unwrap_or_default();

    format!(
        "User Role: {role}\nLanguage: {language}\n{context}{severity}\n\
         User Message:\n{message}\n\n\
         Respond clearly, safely and responsibly, in {language}.",
        context = context_block(health_context),
    )
}

pub fn nearby_hospitals(city: &str, specialty: Option<&str>, language: &str) -> String {
    let specialty = specialty
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!(" specializing in {s}"))
        .unwrap_or_default();

    format!(
        "List 5 hospitals{specialty} near {city}, India.\n\
         Return a valid JSON array of objects with the fields name, address, phone \
         and specialties (list of strings). Write addresses in {language} when possible."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_only_when_present() {
        let with = symptom_analysis("fever", "English", Some("ALLERGIES: Penicillin"), Role::Patient);
        assert!(with.contains("Patient Context:\nALLERGIES: Penicillin"));

        let without = symptom_analysis("fever", "English", Some("  "), Role::Patient);
        assert!(!without.contains("Patient Context"));
    }

    #[test]
    fn test_hospital_specialty_is_optional() {
        assert!(nearby_hospitals("Pune", Some("Cardiology"), "English")
            .starts_with("List 5 hospitals specializing in Cardiology near Pune"));
        assert!(nearby_hospitals("Pune", Some(""), "English").starts_with("List 5 hospitals near Pune"));
    }

    #[test]
    fn test_chat_mentions_severity() {
        let prompt = medical_chat("Is it serious?", "English", Role::Doctor, None, Some("High"));
        assert!(prompt.contains("User Role: Doctor"));
        assert!(prompt.contains("Last assessed severity: High"));
    }
}
