pub fn build_verification_prompt(answer: &str, chunks: &[&str]) -> String {
    let mut sources = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        sources.push_str(&format!("[Source {}]\n{}\n\n", i + 1, chunk));
    }

    format!(
        r#"Check the factual claims of an answer against its source texts.

SOURCES:
{}
ANSWER TO CHECK:
{}

INSTRUCTIONS:
1. Break the answer into individual factual claims
2. Label each claim "verified" if the sources support it, "refuted" if they contradict it, "inconclusive" otherwise
3. Give a confidence from 0.0 to 1.0 for each label
4. Quote the supporting or contradicting source text as evidence
5. Output ONLY valid JSON in this schema, no markdown, no explanations:

{{"claims": [{{"text": "claim", "status": "verified|refuted|inconclusive", "confidence": 0.9, "evidence": ["quote"]}}]}}

VERIFICATION:"#,
        sources, answer
    )
}
