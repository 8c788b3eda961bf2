// All LLM prompt constants for the Matching module.

/// System prompt for resume analysis — enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str =
    "You are an expert ATS (Applicant Tracking System) analyst and recruiter. \
    Evaluate how well a resume matches a job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Analysis prompt template. Replace `{jd_text}` before sending.
/// The resume itself travels as a document attachment on the same message.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the attached resume against the following job description, the way a strict ATS screen combined with an experienced recruiter would.

Return a JSON object with this EXACT schema (no extra fields):
{
  "score": 72,
  "summary": "Two-sentence overall verdict on the match.",
  "strengths": ["Directly relevant experience with X"],
  "weaknesses": ["No mention of Y despite it being a hard requirement"],
  "missing_keywords": ["Kubernetes", "gRPC"],
  "formatting_issues": ["Tables may not parse in older ATS software"],
  "improvement_plan": ["Add a skills section listing the missing keywords you genuinely have"]
}

Rules for scoring:
- `score` is an integer from 0 to 100: below 40 is a poor match, 40-69 partial, 70-84 strong, 85+ excellent.
- Weigh explicit hard requirements (phrases like "required", "must have", minimum years) far more heavily than nice-to-haves.
- `missing_keywords` lists concrete terms from the job description absent from the resume — technologies, certifications, methodologies.
- `formatting_issues` covers machine-readability only: layout, tables, images, fonts, section headings an ATS may mishandle.
- `improvement_plan` gives concrete, ordered steps the candidate can act on. Never advise inventing experience.

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for resume rewriting — enforces raw-HTML-only output.
pub const REWRITE_SYSTEM: &str =
    "You are an expert resume writer producing an improved version of a candidate's resume. \
    You MUST respond with a single complete HTML document and nothing else. \
    Do NOT use markdown code fences. \
    Do NOT include any commentary before or after the HTML. \
    Do NOT invent experience, employers, dates, or credentials not present in the original resume.";

/// Rewrite prompt template.
/// Replace: {jd_text}, {analysis_json}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite the attached resume to better match the job description below, guided by the prior analysis.

Prior analysis of this resume against this job description:
{analysis_json}

HARD RULES:
1. Preserve the original resume's overall structure and section headings — clone its skeleton, improve its content
2. Keep every fact truthful: rephrase and reorder, never fabricate
3. Work the `missing_keywords` in naturally where the candidate's real experience supports them
4. Address the listed `weaknesses` and `formatting_issues` directly
5. Output a complete standalone HTML document with embedded CSS
6. Typography: Arial or a close sans-serif, 10-11pt body text, single column
7. Page geometry: A4/Letter with 1 inch margins, suitable for printing to one or two pages
8. No images, no tables for layout, no external resources

JOB DESCRIPTION:
{jd_text}"#;
