//! Crop list editing.
//!
//! Stores accept any crop list; these helpers keep lists handed to them free of blank and
//! duplicate entries. Every operation returns a new list and leaves the input untouched.

use std::collections::HashSet;

use crate::errors::AppError;

const EMPTY_CROP: &str = "Please enter a crop name";
const DUPLICATE_CROP: &str = "This crop is already in your list";

/// Append a crop after trimming it.
pub fn add_crop(crops: &[String], name: &str) -> Result<Vec<String>, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(EMPTY_CROP.to_string()));
    }
    if crops.iter().any(|c| c == name) {
        return Err(AppError::Validation(DUPLICATE_CROP.to_string()));
    }

    let mut updated = crops.to_vec();
    updated.push(name.to_string());
    Ok(updated)
}

/// Replace the crop at `index`. Renaming an entry to itself is allowed.
pub fn rename_crop(crops: &[String], index: usize, name: &str) -> Result<Vec<String>, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Crop name cannot be empty".to_string()));
    }
    if index >= crops.len() {
        return Err(index_not_found(index));
    }
    if crops
        .iter()
        .enumerate()
        .any(|(i, c)| i != index && c == name)
    {
        return Err(AppError::Validation(DUPLICATE_CROP.to_string()));
    }

    let mut updated = crops.to_vec();
    updated[index] = name.to_string();
    Ok(updated)
}

/// Drop the crop at `index`.
pub fn remove_crop(crops: &[String], index: usize) -> Result<Vec<String>, AppError> {
    if index >= crops.len() {
        return Err(index_not_found(index));
    }

    let mut updated = crops.to_vec();
    updated.remove(index);
    Ok(updated)
}

/// Check a whole list submitted with a profile.
pub fn validate_crops(crops: &[String]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(crops.len());
    for crop in crops {
        if crop.trim().is_empty() {
            return Err(AppError::Validation(EMPTY_CROP.to_string()));
        }
        if !seen.insert(crop.as_str()) {
            return Err(AppError::Validation(format!(
                "Crop '{}' is listed more than once",
                crop
            )));
        }
    }
    Ok(())
}

fn index_not_found(index: usize) -> AppError {
    AppError::NotFound(format!("Crop at position {} not found", index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_trims_and_appends() {
        let crops = add_crop(&list(&["corn"]), "  wheat ").unwrap();
        assert_eq!(crops, list(&["corn", "wheat"]));
    }

    #[test]
    fn test_add_rejects_blank_and_duplicate() {
        assert_eq!(
            add_crop(&list(&["corn"]), "   ").unwrap_err(),
            AppError::Validation(EMPTY_CROP.to_string())
        );
        assert_eq!(
            add_crop(&list(&["corn"]), " corn").unwrap_err(),
            AppError::Validation(DUPLICATE_CROP.to_string())
        );
    }

    #[test]
    fn test_rename() {
        let crops = list(&["corn", "wheat"]);
        assert_eq!(
            rename_crop(&crops, 1, "barley").unwrap(),
            list(&["corn", "barley"])
        );
        // Same name at the same position is not a duplicate
        assert_eq!(rename_crop(&crops, 0, "corn").unwrap(), crops);
        assert!(matches!(
            rename_crop(&crops, 0, "wheat"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            rename_crop(&crops, 5, "rye"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let crops = list(&["corn", "wheat", "rye"]);
        assert_eq!(remove_crop(&crops, 1).unwrap(), list(&["corn", "rye"]));
        assert!(matches!(remove_crop(&crops, 3), Err(AppError::NotFound(_))));
        assert!(matches!(remove_crop(&[], 0), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_validate_crops() {
        assert!(validate_crops(&[]).is_ok());
        assert!(validate_crops(&list(&["corn", "wheat"])).is_ok());
        assert!(validate_crops(&list(&["corn", ""])).is_err());
        assert!(validate_crops(&list(&["corn", "corn"])).is_err());
    }
}
