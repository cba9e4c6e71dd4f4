// All prompt templates for the analysis pipeline.
// Placeholders are `{name}`; the builder fills `{formatInstructions}` and `{outputRules}`
// itself, everything else comes from the caller.

/// Job description extraction. Inputs: `{jobDescription}`.
pub const JOB_DETAILS_TEMPLATE: &str = r#"You are an information extraction system.

Extract structured information from the job description.

{outputRules}

If a field is missing:
- Use 0 for experience_required
- Use empty list [] for lists
- Use empty string "" for job_title if missing

{formatInstructions}

Job Description:
{jobDescription}"#;

/// Resume comparison. Inputs: `{jobDetails}`, `{resume}`.
pub const RESUME_SUGGESTIONS_TEMPLATE: &str = r#"You are an AI career coach.

Compare the job details with the resume and provide structured suggestions.
List skills the job requires that the resume does not demonstrate, concrete
improvements the candidate could make to the resume, and a short overall fit summary.

{outputRules}

{formatInstructions}

Job Details:
{jobDetails}

Resume:
{resume}"#;

/// Cover letter. Inputs: `{jobTitle}`, `{jobDetails}`, `{resume}`.
pub const COVER_LETTER_TEMPLATE: &str = r#"Write a professional and concise cover letter.

Job Title: {jobTitle}

Job Details:
{jobDetails}

Candidate Resume:
{resume}

{outputRules}
Return only the cover letter text."#;
