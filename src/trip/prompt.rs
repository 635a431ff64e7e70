use super::models::GenerationRequest;

/// Renders the itinerary prompt for a validated request.
///
/// Pure function of its input. The day sections, the budget table and the
/// tips sections are what the results page parses for display, so their
/// headings must not drift.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let days = request.days();
    let budget = request.budget();
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "Plan a complete {days}-day vacation itinerary that fits a total budget of ${budget} USD.\n\
         \n\
         Traveler interests: {interests}\n\
         \n\
         Give specific, named recommendations with realistic prices. \
         Reply in markdown using exactly this structure:\n\
         \n\
         # Your {days}-Day Trip\n\
         \n",
        interests = request.interests(),
    ));

    prompt.push_str(DAY_TEMPLATE);
    prompt.push_str(&format!(
        "\n---\n\
         \n\
         [Repeat the day section above for each of the {days} days]\n\
         \n\
         ---\n\
         \n"
    ));
    prompt.push_str(BUDGET_TABLE);
    prompt.push_str(TIPS_SECTIONS);
    prompt
}

const DAY_TEMPLATE: &str = "## Day 1: [Theme of the day]

### Morning
- **Activity:** [Activity and exact location]
- **Cost:** $XX
- **Tip:** [Short local tip]

### Afternoon
- **Lunch:** [Restaurant name]
- **Cost:** $XX
- **Activity:** [Main afternoon activity]
- **Cost:** $XX

### Evening
- **Dinner:** [Restaurant name]
- **Cost:** $XX
- **Activity:** [Evening plan]
- **Cost:** $XX

### Accommodation
- **Hotel:** [Hotel name and neighborhood]
- **Cost:** $XX/night

**Day 1 Total: $XXX**
";

const BUDGET_TABLE: &str = "## Budget Breakdown

| Category | Amount |
|----------|--------|
| Accommodation | $XXX |
| Food & Dining | $XXX |
| Activities | $XXX |
| Transportation | $XXX |
| **Total** | **$XXX** |

";

const TIPS_SECTIONS: &str = "## Money-Saving Tips
- [3-4 practical tips]

## Travel Essentials
- [What to pack and prepare]

Keep the total at or under the budget and make every recommendation specific.";
