//! Listing-description prompt rendering.
//!
//! The template pins the model to the supplied facts and to a fixed
//! three-paragraph layout. Absent facts are spelled out with placeholders so
//! the model sees an explicit gap rather than a missing line.

use crate::models::FactSet;

/// Placeholder for an absent location, amenities, vibe or capacity.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Placeholder for absent additional details.
pub const NONE_PROVIDED: &str = "None provided";

/// Render the generation prompt for `facts`.
pub fn build_prompt(facts: &FactSet) -> String {
    format!(
        "You are writing an Airbnb listing description. CRITICAL: Use ONLY the information provided below. Do NOT invent, add, or assume any details that are not explicitly stated.

PROPERTY INFORMATION (USE ONLY THESE FACTS):
- Location: {location}
- Amenities: {amenities}
- Vibe/Style: {vibe}
- Capacity: {capacity}
- Additional Details: {additional}

INSTRUCTIONS:
1. Write a 3-paragraph description using ONLY the facts provided above
2. Do NOT add amenities, features, or details that are not listed
3. Do NOT make assumptions about the property beyond what is stated
4. If a field above was left unspecified, do NOT invent details for it
5. Stay true to the exact location, amenities, vibe, and capacity provided
6. Make it warm, professional, and enticing while being 100% accurate to the provided information

Paragraph 1: Introduce the property and location using the exact location provided
Paragraph 2: Describe the amenities and features using ONLY what is listed in the amenities field
Paragraph 3: Conclude with the vibe/style and what makes it special, using the vibe and additional details provided

Remember: Accuracy is more important than creativity. Use only the provided facts.",
        location = or_placeholder(&facts.location, NOT_SPECIFIED),
        amenities = or_placeholder(&facts.amenities, NOT_SPECIFIED),
        vibe = or_placeholder(&facts.vibe, NOT_SPECIFIED),
        capacity = or_placeholder(&facts.capacity, NOT_SPECIFIED),
        additional = or_placeholder(&facts.additional_details, NONE_PROVIDED),
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
