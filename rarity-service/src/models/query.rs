use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::RarityError;

pub const DEFAULT_RESULT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesType {
    Aves,
    Amphibia,
    Reptilia,
    Mammalia,
    Actinopterygii,
    Mollusca,
    Arachnida,
    Insecta,
    Plantae,
    Fungi,
    Chromista,
    Protozoa,
    Animalia,
}

impl SpeciesType {
    pub const ALL: [SpeciesType; 13] = [
        SpeciesType::Aves,
        SpeciesType::Amphibia,
        SpeciesType::Reptilia,
        SpeciesType::Mammalia,
        SpeciesType::Actinopterygii,
        SpeciesType::Mollusca,
        SpeciesType::Arachnida,
        SpeciesType::Insecta,
        SpeciesType::Plantae,
        SpeciesType::Fungi,
        SpeciesType::Chromista,
        SpeciesType::Protozoa,
        SpeciesType::Animalia,
    ];

    /// Value sent as the `iconic_taxa` request parameter.
    pub fn api_name(self) -> &'static str {
        match self {
            SpeciesType::Aves => "Aves",
            SpeciesType::Amphibia => "Amphibia",
            SpeciesType::Reptilia => "Reptilia",
            SpeciesType::Mammalia => "Mammalia",
            SpeciesType::Actinopterygii => "Actinopterygii",
            SpeciesType::Mollusca => "Mollusca",
            SpeciesType::Arachnida => "Arachnida",
            SpeciesType::Insecta => "Insecta",
            SpeciesType::Plantae => "Plantae",
            SpeciesType::Fungi => "Fungi",
            SpeciesType::Chromista => "Chromista",
            SpeciesType::Protozoa => "Protozoa",
            SpeciesType::Animalia => "Animalia",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeciesType::Aves => "Birds",
            SpeciesType::Amphibia => "Amphibians",
            SpeciesType::Reptilia => "Reptiles",
            SpeciesType::Mammalia => "Mammals",
            SpeciesType::Actinopterygii => "Ray-finned Fishes",
            SpeciesType::Mollusca => "Mollusks",
            SpeciesType::Arachnida => "Arachnids",
            SpeciesType::Insecta => "Insects",
            SpeciesType::Plantae => "Plants",
            SpeciesType::Fungi => "Fungi",
            SpeciesType::Chromista => "Chromists",
            SpeciesType::Protozoa => "Protozoans",
            SpeciesType::Animalia => "Other Animals",
        }
    }
}

impl FromStr for SpeciesType {
    type Err = RarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SpeciesType::ALL
            .iter()
            .copied()
            .find(|t| t.api_name().eq_ignore_ascii_case(wanted) || t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RarityError::InvalidInput(format!("Unknown species type '{}'.", wanted)))
    }
}

impl fmt::Display for SpeciesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Research,
    NeedsId,
    Casual,
}

impl QualityGrade {
    pub const ALL: [QualityGrade; 3] = [
        QualityGrade::Research,
        QualityGrade::NeedsId,
        QualityGrade::Casual,
    ];

    pub fn api_name(self) -> &'static str {
        match self {
            QualityGrade::Research => "research",
            QualityGrade::NeedsId => "needs_id",
            QualityGrade::Casual => "casual",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityGrade::Research => "Research",
            QualityGrade::NeedsId => "Needs ID",
            QualityGrade::Casual => "Casual",
        }
    }
}

impl FromStr for QualityGrade {
    type Err = RarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QualityGrade::ALL
            .iter()
            .copied()
            .find(|g| g.api_name().eq_ignore_ascii_case(wanted) || g.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RarityError::InvalidInput(format!("Unknown quality grade '{}'.", wanted)))
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// HTML form submission. Checkbox fields are present only when ticked.
#[derive(Debug, Default, Deserialize)]
pub struct ObserverForm {
    #[serde(alias = "username")]
    pub observer_id: Option<String>,
    pub filter_by_species_type: Option<String>,
    pub species_type: Option<String>,
    pub number_of_results: Option<String>,
    pub filter_by_quality_grade: Option<String>,
    pub quality_grade: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiQueryParams {
    pub observer_id: Option<String>,
    pub species_type: Option<String>,
    pub quality_grade: Option<String>,
    #[serde(alias = "number_of_results")]
    pub result_count: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverQuery {
    pub observer_id: String,
    pub species_type_filter: Option<SpeciesType>,
    pub quality_grade_filter: Option<QualityGrade>,
    pub result_count: usize,
}

fn observer_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("observer id pattern compiles"))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ObserverQuery {
    pub fn parse(
        observer_id: Option<&str>,
        species_type: Option<&str>,
        quality_grade: Option<&str>,
        result_count: Option<&str>,
        max_result_count: usize,
    ) -> Result<Self, RarityError> {
        let observer_id = non_blank(observer_id)
            .ok_or_else(|| RarityError::InvalidInput("Please enter an observer ID.".to_string()))?;
        if !observer_id_pattern().is_match(observer_id) {
            return Err(RarityError::InvalidInput(format!(
                "'{}' is not a valid observer ID.",
                observer_id
            )));
        }

        // "all species" is an explicit no-filter choice on the form.
        let species_type_filter = match non_blank(species_type) {
            Some(v) if v.eq_ignore_ascii_case("all species") || v.eq_ignore_ascii_case("all") => None,
            Some(v) => Some(v.parse::<SpeciesType>()?),
            None => None,
        };
        let quality_grade_filter = match non_blank(quality_grade) {
            Some(v) if v.eq_ignore_ascii_case("any") => None,
            Some(v) => Some(v.parse::<QualityGrade>()?),
            None => None,
        };

        let result_count = match non_blank(result_count) {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                RarityError::InvalidInput(format!("'{}' is not a valid number of results.", raw))
            })?,
            None => DEFAULT_RESULT_COUNT,
        };
        if result_count == 0 || result_count > max_result_count {
            return Err(RarityError::InvalidInput(format!(
                "The number of results must be between 1 and {}.",
                max_result_count
            )));
        }

        Ok(Self {
            observer_id: observer_id.to_string(),
            species_type_filter,
            quality_grade_filter,
            result_count,
        })
    }

    pub fn from_form(form: &ObserverForm, max_result_count: usize) -> Result<Self, RarityError> {
        let species_type = form
            .filter_by_species_type
            .as_ref()
            .and(form.species_type.as_deref());
        let quality_grade = form
            .filter_by_quality_grade
            .as_ref()
            .and(form.quality_grade.as_deref());
        Self::parse(
            form.observer_id.as_deref(),
            species_type,
            quality_grade,
            form.number_of_results.as_deref(),
            max_result_count,
        )
    }

    pub fn from_api(params: &ApiQueryParams, max_result_count: usize) -> Result<Self, RarityError> {
        Self::parse(
            params.observer_id.as_deref(),
            params.species_type.as_deref(),
            params.quality_grade.as_deref(),
            params.result_count.as_deref(),
            max_result_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_filters_are_ignored() {
        let form = ObserverForm {
            observer_id: Some(" kestrel ".to_string()),
            species_type: Some("Aves".to_string()),
            quality_grade: Some("research".to_string()),
            ..Default::default()
        };
        let query = ObserverQuery::from_form(&form, 100).unwrap();
        assert_eq!(query.observer_id, "kestrel");
        assert_eq!(query.species_type_filter, None);
        assert_eq!(query.quality_grade_filter, None);
        assert_eq!(query.result_count, DEFAULT_RESULT_COUNT);
    }

    #[test]
    fn checked_filters_are_parsed() {
        let form = ObserverForm {
            observer_id: Some("kestrel".to_string()),
            filter_by_species_type: Some("on".to_string()),
            species_type: Some("insecta".to_string()),
            filter_by_quality_grade: Some("on".to_string()),
            quality_grade: Some("needs_id".to_string()),
            number_of_results: Some("12".to_string()),
        };
        let query = ObserverQuery::from_form(&form, 100).unwrap();
        assert_eq!(query.species_type_filter, Some(SpeciesType::Insecta));
        assert_eq!(query.quality_grade_filter, Some(QualityGrade::NeedsId));
        assert_eq!(query.result_count, 12);
    }

    #[test]
    fn all_species_means_no_filter() {
        let query = ObserverQuery::parse(Some("kestrel"), Some("all species"), None, None, 10).unwrap();
        assert_eq!(query.species_type_filter, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(ObserverQuery::parse(None, None, None, None, 10).is_err());
        assert!(ObserverQuery::parse(Some("a b"), None, None, None, 10).is_err());
        assert!(ObserverQuery::parse(Some("kestrel"), Some("Dragons"), None, None, 10).is_err());
        assert!(ObserverQuery::parse(Some("kestrel"), None, Some("gold"), None, 10).is_err());
        assert!(ObserverQuery::parse(Some("kestrel"), None, None, Some("0"), 10).is_err());
        assert!(ObserverQuery::parse(Some("kestrel"), None, None, Some("11"), 10).is_err());
        assert!(ObserverQuery::parse(Some("kestrel"), None, None, Some("five"), 10).is_err());
    }
}
