/// Replies the model gives when it finds nothing, after lower-casing.
pub const NO_SYMPTOM_MARKERS: &[&str] = &["empty", "no symptoms"];

/// Build the extraction prompt for one raw patient description.
pub fn build_extraction_prompt(raw_symptoms: &str) -> String {
    format!(
        "Extract all relevant symptoms from the following raw medical input. \
         Correct any spelling mistakes in the symptoms before extracting them. \
         Return only the symptoms as a comma-separated list. \
         If you are unable to extract any symptoms, return only the string 'No Symptoms'.\n\
         Raw data: {raw_symptoms}"
    )
}
