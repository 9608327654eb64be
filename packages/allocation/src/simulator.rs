//! A user's in-progress allocation for one municipality.

use muni_budget_allocation_models::{AllocationCategory, AllocationSubmission, FULL_ALLOCATION};
use muni_budget_municipality_models::MunicipalityRecord;

use crate::AllocationError;
use crate::catalog::{CategoryDefinition, amount_for, default_catalog};

/// Where a new allocation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartingPoint {
    /// Every category at its catalog percentage.
    Defaults,
    /// Every category at zero.
    Empty,
}

/// Percentages per category, with amounts and total kept in sync.
///
/// Percentages are never clamped. A total above 100 is a valid
/// over-allocated state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSimulator {
    municipality_id: String,
    municipality_name: String,
    total_budget: f64,
    categories: Vec<AllocationCategory>,
    total_percentage: f64,
}

impl AllocationSimulator {
    /// Starts from the default catalog for a municipality.
    #[must_use]
    pub fn new(record: &MunicipalityRecord, start: StartingPoint) -> Self {
        Self::with_catalog(
            &record.id,
            &record.name,
            record.budget,
            default_catalog(),
            start,
        )
    }

    #[must_use]
    pub fn with_catalog(
        municipality_id: &str,
        municipality_name: &str,
        total_budget: f64,
        catalog: &[CategoryDefinition],
        start: StartingPoint,
    ) -> Self {
        let categories: Vec<AllocationCategory> = catalog
            .iter()
            .map(|def| {
                let percentage = match start {
                    StartingPoint::Defaults => def.percentage,
                    StartingPoint::Empty => 0.0,
                };
                def.allocate(percentage, total_budget)
            })
            .collect();
        let total_percentage = categories.iter().map(|c| c.percentage).sum();

        Self {
            municipality_id: municipality_id.to_string(),
            municipality_name: municipality_name.to_string(),
            total_budget,
            categories,
            total_percentage,
        }
    }

    /// Replaces one category's percentage.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::UnknownCategory`] if no category has this
    /// id. State is unchanged in that case.
    pub fn set_percentage(&mut self, id: &str, percentage: f64) -> Result<(), AllocationError> {
        let category = self
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AllocationError::UnknownCategory(id.to_string()))?;
        category.percentage = percentage;
        self.recompute();
        Ok(())
    }

    /// Sets one category by amount; its percentage follows from the total
    /// budget (zero when the budget is zero).
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::UnknownCategory`] if no category has this
    /// id.
    pub fn set_amount(&mut self, id: &str, amount: f64) -> Result<(), AllocationError> {
        let percentage = if self.total_budget > 0.0 {
            amount / self.total_budget * 100.0
        } else {
            0.0
        };
        self.set_percentage(id, percentage)
    }

    fn recompute(&mut self) {
        for category in &mut self.categories {
            category.amount = amount_for(category.percentage, self.total_budget);
        }
        self.total_percentage = self.categories.iter().map(|c| c.percentage).sum();
    }

    #[must_use]
    pub fn categories(&self) -> &[AllocationCategory] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, id: &str) -> Option<&AllocationCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub const fn total_budget(&self) -> f64 {
        self.total_budget
    }

    /// Sum of all category percentages.
    #[must_use]
    pub const fn total_percentage(&self) -> f64 {
        self.total_percentage
    }

    /// `100 - total`; negative when over-allocated.
    #[must_use]
    pub fn remaining_percentage(&self) -> f64 {
        FULL_ALLOCATION - self.total_percentage
    }

    #[must_use]
    pub fn is_over_allocated(&self) -> bool {
        self.total_percentage > FULL_ALLOCATION
    }

    /// Packages the current state for the record sink.
    ///
    /// The note is kept only when over-allocated and not blank.
    #[must_use]
    pub fn build_submission(&self, ideas: Option<&str>) -> AllocationSubmission {
        let over_budget = self.is_over_allocated();
        let over_budget_ideas = ideas
            .filter(|_| over_budget)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        AllocationSubmission {
            municipality_id: self.municipality_id.clone(),
            municipality_name: self.municipality_name.clone(),
            total_budget: self.total_budget,
            categories: self.categories.clone(),
            over_budget,
            over_budget_ideas,
        }
    }
}

#[cfg(test)]
mod tests {
    use muni_budget_municipality_models::{BudgetSources, MunicipalityType};

    use super::*;

    fn record() -> MunicipalityRecord {
        MunicipalityRecord {
            id: "5101".into(),
            name: "เทศบาลเมืองลำพูน".into(),
            municipality_type: MunicipalityType::Town,
            type_label: "เทศบาลเมือง".into(),
            province: "ลำพูน".into(),
            district: "เมืองลำพูน".into(),
            budget: 400_000_000.0,
            population: None,
            area: None,
            budget_sources: BudgetSources::estimate(MunicipalityType::Town, 400_000_000.0),
        }
    }

    #[test]
    fn defaults_sum_to_100_and_scale_amounts() {
        let sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        assert!((sim.total_percentage() - 100.0).abs() < 1e-9);
        assert!(!sim.is_over_allocated());
        let infra = sim.category("infrastructure").unwrap();
        assert!((infra.amount - 120_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn empty_start_is_all_zero() {
        let sim = AllocationSimulator::new(&record(), StartingPoint::Empty);
        assert!(sim.categories().iter().all(|c| c.percentage == 0.0 && c.amount == 0.0));
        assert!((sim.remaining_percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn total_of_105_is_over_budget() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        sim.set_percentage("water", 10.0).unwrap();

        assert!((sim.total_percentage() - 105.0).abs() < 1e-9);
        assert!((sim.remaining_percentage() + 5.0).abs() < 1e-9);
        let submission = sim.build_submission(Some("เก็บภาษีป้ายเพิ่ม"));
        assert!(submission.over_budget);
        assert_eq!(submission.over_budget_ideas.as_deref(), Some("เก็บภาษีป้ายเพิ่ม"));
    }

    #[test]
    fn total_of_100_is_not_over_budget_and_drops_note() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        sim.set_percentage("water", 0.0).unwrap();
        sim.set_percentage("economy", 10.0).unwrap();

        let submission = sim.build_submission(Some("ignored"));
        assert!(!submission.over_budget);
        assert_eq!(submission.over_budget_ideas, None);
        assert_eq!(submission.categories.len(), 8);
        assert_eq!(submission.municipality_id, "5101");
        assert!((submission.total_budget - 400_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn blank_note_is_dropped_even_when_over() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        sim.set_percentage("culture", 50.0).unwrap();
        assert_eq!(sim.build_submission(Some("   ")).over_budget_ideas, None);
        assert_eq!(sim.build_submission(None).over_budget_ideas, None);
    }

    #[test]
    fn set_percentage_recomputes_amount() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Empty);
        sim.set_percentage("disaster", 12.5).unwrap();
        assert!((sim.category("disaster").unwrap().amount - 50_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn negative_percentages_are_accepted() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        sim.set_percentage("governance", -6.0).unwrap();
        assert!((sim.total_percentage() - 88.0).abs() < 1e-9);
        assert!(sim.category("governance").unwrap().amount < 0.0);
    }

    #[test]
    fn unknown_category_leaves_state_untouched() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Defaults);
        let before = sim.clone();
        let err = sim.set_percentage("parks", 50.0).unwrap_err();
        assert!(matches!(err, AllocationError::UnknownCategory(ref id) if id == "parks"));
        assert_eq!(sim, before);
    }

    #[test]
    fn set_amount_derives_percentage() {
        let mut sim = AllocationSimulator::new(&record(), StartingPoint::Empty);
        sim.set_amount("water", 100_000_000.0).unwrap();
        assert!((sim.category("water").unwrap().percentage - 25.0).abs() < 1e-9);
    }

    #[test]
    fn set_amount_with_zero_budget_is_zero_percent() {
        let mut sim =
            AllocationSimulator::with_catalog("x", "x", 0.0, default_catalog(), StartingPoint::Empty);
        sim.set_amount("water", 1_000.0).unwrap();
        assert!(sim.category("water").unwrap().percentage.abs() < f64::EPSILON);
    }
}
