use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::recipe::GeneratedRecipe;

/// Strips a leading/trailing markdown code fence if the model echoed one.
/// The model is instructed not to, but does not always comply.
fn strip_code_fence(text: &str) -> &str {
    let mut clean = text.trim();

    if let Some(rest) = clean.strip_prefix("```json") {
        clean = rest;
    } else if let Some(rest) = clean.strip_prefix("```") {
        clean = rest;
    }

    if let Some(rest) = clean.strip_suffix("```") {
        clean = rest;
    }

    clean.trim()
}

/// Parses model output into recipe records.
///
/// Missing ids are backfilled with a generated unique id and a missing match
/// percentage falls back to the default. Never returns a partial list: any
/// parse failure is a `MalformedContent` error.
///
/// # Arguments
///
/// * `raw_text` - The raw model output.
///
/// # Returns
///
/// A `Result` containing the parsed recipes.
pub fn parse_recipes(raw_text: &str) -> Result<Vec<GeneratedRecipe>> {
    let clean = strip_code_fence(raw_text);

    let mut recipes: Vec<GeneratedRecipe> = sonic_rs::from_str(clean)
        .map_err(|e| AppError::MalformedContent(format!("Failed to parse recipe data: {}", e)))?;

    for recipe in &mut recipes {
        if recipe.id.is_empty() {
            recipe.id = format!("recipe-{}", Uuid::new_v4());
        }
    }

    Ok(recipes)
}

/// Parses model output from the vision path into ingredient names.
///
/// # Arguments
///
/// * `raw_text` - The raw model output.
///
/// # Returns
///
/// A `Result` containing the ingredient name list.
pub fn parse_ingredients(raw_text: &str) -> Result<Vec<String>> {
    let clean = strip_code_fence(raw_text);

    sonic_rs::from_str(clean)
        .map_err(|e| AppError::MalformedContent(format!("Failed to parse ingredient list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::FALLBACK_MATCH_PERCENTAGE;

    const RECIPE_ARRAY: &str = r#"[
        {"id":"r1","name":"Garlic Chicken Rice","description":"One-pan dinner",
         "cookingTime":35,"difficulty":"Easy","servings":4,"calories":520,
         "cuisine":"Asian","dietaryTags":["gluten-free"],"matchPercentage":92,
         "ingredients":[{"name":"chicken","amount":"500g","userHas":true}],
         "instructions":["Sear the chicken.","Add rice and simmer."],
         "nutritionalInfo":{"protein":"38g","carbs":"55g","fat":"14g","fiber":"2g"},
         "tips":"Rest before serving."}
    ]"#;

    #[test]
    fn fenced_and_unfenced_parse_identically() {
        let plain = parse_recipes(RECIPE_ARRAY).unwrap();
        let fenced = parse_recipes(&format!("```json\n{}\n```", RECIPE_ARRAY)).unwrap();
        let bare_fence = parse_recipes(&format!("```\n{}\n```", RECIPE_ARRAY)).unwrap();

        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].id, fenced[0].id);
        assert_eq!(plain[0].name, bare_fence[0].name);
        assert_eq!(plain[0].match_percentage, 92);
    }

    #[test]
    fn missing_id_and_match_are_backfilled() {
        let recipes =
            parse_recipes(r#"[{"name":"Soup"},{"name":"Stew"}]"#).unwrap();

        assert_eq!(recipes.len(), 2);
        for recipe in &recipes {
            assert!(recipe.id.starts_with("recipe-"));
            assert_eq!(recipe.match_percentage, FALLBACK_MATCH_PERCENTAGE);
        }
        assert_ne!(recipes[0].id, recipes[1].id);
    }

    #[test]
    fn invalid_json_is_malformed_content() {
        let err = parse_recipes("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, AppError::MalformedContent(_)));
    }

    #[test]
    fn object_instead_of_array_is_malformed_content() {
        let err = parse_recipes(r#"{"name":"Soup"}"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedContent(_)));
    }

    #[test]
    fn ingredient_list_parses_with_and_without_fence() {
        let expected = vec!["chicken", "tomato", "garlic"];
        let plain = parse_ingredients(r#"["chicken","tomato","garlic"]"#).unwrap();
        let fenced =
            parse_ingredients("```json\n[\"chicken\",\"tomato\",\"garlic\"]\n```").unwrap();

        assert_eq!(plain, expected);
        assert_eq!(fenced, expected);
    }

    #[test]
    fn ingredient_parse_failure_is_typed() {
        assert!(matches!(
            parse_ingredients("no list here").unwrap_err(),
            AppError::MalformedContent(_)
        ));
    }
}
