use crate::model::AuditRequest;

/// Consultant persona handed to the generative service with every audit.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an AI business consultant focused on sustainability.
Your goal is to:
1. Analyze the input metrics.
2. Give a numeric eco-friendliness score (0-100).
3. Suggest practical, cost-effective, and labor-friendly ways to make the business/product more eco-friendly.
4. Be enthusiastic, clear, and brutally honest; do not leave suggestions vague or open-ended.";

/// Render the audit prompt. The strict `Score: [0-100]/100` opening line
/// is a soft contract: the extractor keeps working when the reply ignores
/// it.
pub fn render_prompt(request: &AuditRequest) -> String {
    format!(
        "Business Idea: {}\n\
         Paper Usage (reams): {}\n\
         Cloud Spending ($): {}\n\
         Percent Remote: {}%\n\
         Disposable Items Cost ($): {}\n\
         Electricity Usage (kWh): {}\n\
         Total Waste Volume (kg): {}\n\n\
         Based on these inputs, provide a detailed sustainability report.\n\
         Start the response STRICTLY with the score in this format:\n\
         \"Score: [0-100]/100\"\n\n\
         Then, provide sections for:\n\
         ## Executive Summary\n\
         ## Detailed Analysis\n\
         ## Actionable Recommendations (prioritized list)\n\
         ## Estimated Savings",
        request.text,
        request.paper_usage,
        request.cloud_spending,
        request.remote_percent,
        request.disposable_cost,
        request.electricity_usage,
        request.waste_volume,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_metrics_and_score_contract() {
        let request = AuditRequest {
            text: "Bamboo bicycle shop".to_string(),
            paper_usage: 2.0,
            cloud_spending: 55.5,
            remote_percent: 80.0,
            disposable_cost: 12.0,
            electricity_usage: 400.0,
            waste_volume: 9.0,
        };
        let prompt = render_prompt(&request);
        assert!(prompt.contains("Business Idea: Bamboo bicycle shop"));
        assert!(prompt.contains("Cloud Spending ($): 55.5"));
        assert!(prompt.contains("Percent Remote: 80%"));
        assert!(prompt.contains("\"Score: [0-100]/100\""));
        assert!(prompt.contains("## Actionable Recommendations"));
    }
}
