//! Prompt templates
//!
//! Placeholders are written `{name}` and filled by [`render`]. JSON braces in
//! the templates are left alone because they never spell a placeholder name.

/// Asks for a `{"summary": ...}` object.
pub const DOCUMENT_SUMMARY: &str = r#"Provide a brief, clear summary of this terms and conditions document.
Return ONLY a JSON object in this exact format:
{
  "summary": "A concise 2-3 sentence summary of the main points and purpose of this document"
}

Document to analyze:
{document}"#;

/// Asks for the "Privacy Policy" section object.
pub const PRIVACY_POLICY: &str = r#"You are a legal document analyzer specializing in privacy policies. Analyze the privacy-related aspects of this terms and conditions document.

Focus on:
- How personal data is collected
- How data is stored and protected
- What the data is used for
- User privacy rights
- Data retention policies

Return your analysis as a JSON object with this EXACT format:
{
  "title": "Privacy Policy",
  "content": "A clear, detailed summary of all privacy-related aspects. For example: 'The service collects email and usage data, stores it securely using encryption, and retains it for 12 months. Data is used for service improvement and personalization. Users can request data deletion.'"
}

Important: Provide specific details from the document, not generic statements. If no privacy information is found, explain what's missing.

Document to analyze:
{document}"#;

/// Asks for the "Data Sharing" section object.
pub const DATA_SHARING: &str = r#"Analyze the data sharing aspects of this terms and conditions document.
Return ONLY a JSON object in this exact format:
{
  "title": "Data Sharing",
  "content": "Clear description of third-party sharing policies"
}

Document to analyze:
{document}"#;

/// Asks for the "User Responsibilities" section object.
pub const USER_RESPONSIBILITIES: &str = r#"Analyze the user responsibilities in this terms and conditions document.
Return ONLY a JSON object in this exact format:
{
  "title": "User Responsibilities",
  "content": "Clear description of what users must comply with"
}

Document to analyze:
{document}"#;

/// Asks for a `{"risks": [...]}` object.
pub const RISK_ASSESSMENT: &str = r#"You are a legal document analyzer specializing in risk assessment. Analyze the risks and potential liabilities in this terms and conditions document.

Focus on identifying risks related to:
- User obligations and responsibilities
- Service limitations and disclaimers
- Liability and indemnification
- Account termination conditions
- Intellectual property violations

Return your analysis as a JSON object with this EXACT format:
{
  "risks": [
    {
      "severity": "high|medium|low",
      "description": "Detailed description of the risk"
    }
  ]
}

Important:
- Each risk must have both severity and description
- Severity must be exactly "high", "medium", or "low"
- Provide specific details from the document, not generic statements
- If no risks are found, explain what types of risks are typically covered

Document to analyze:
{document}"#;

/// Free-form question about the document; the reply is used verbatim.
pub const DOCUMENT_QUESTION: &str = r#"Based on the following Terms and Conditions document, please answer this question:
{question}

Document:
{document}"#;

/// Fills `{name}` placeholders in a single pass
///
/// Substituted values are never rescanned, so a document that happens to
/// contain `{question}` is left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let matched = vars.iter().find(|(name, _)| {
            tail.len() > name.len() + 1
                && tail[1..].starts_with(name)
                && tail[1 + name.len()..].starts_with('}')
        });

        match matched {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
