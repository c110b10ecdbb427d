//! Indicator schema: which CSV column feeds which named field.
//!
//! A [`Field`] is also the selector strategies aggregate over. Callers can
//! name a field by dotted path (`macro.inflation_1y`), bare name
//! (`inflation_1y`), questionnaire code (`c4030`) or a short alias
//! (`inflation`).

use serde::Serialize;
use std::fmt;

/// Questionnaire block an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorGroup {
    Macro,
    Consumption,
    Labor,
    Housing,
    Credit,
}

impl IndicatorGroup {
    pub const ALL: [IndicatorGroup; 5] = [
        IndicatorGroup::Macro,
        IndicatorGroup::Consumption,
        IndicatorGroup::Labor,
        IndicatorGroup::Housing,
        IndicatorGroup::Credit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorGroup::Macro => "macro",
            IndicatorGroup::Consumption => "consumption",
            IndicatorGroup::Labor => "labor",
            IndicatorGroup::Housing => "housing",
            IndicatorGroup::Credit => "credit",
        }
    }
}

/// A numeric indicator and the column it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub group: IndicatorGroup,
    pub name: &'static str,
    pub column: &'static str,
}

impl Field {
    const fn new(group: IndicatorGroup, name: &'static str, column: &'static str) -> Self {
        Self { group, name, column }
    }

    /// Dotted `group.name` path.
    pub fn path(&self) -> String {
        format!("{}.{}", self.group.name(), self.name)
    }

    /// Resolves a selector against the schema, case-insensitively.
    ///
    /// Lookup order: dotted path, column code, bare name, alias.
    pub fn resolve(selector: &str) -> Option<&'static Field> {
        let selector = selector.trim().to_ascii_lowercase();
        if selector.is_empty() {
            return None;
        }

        if let Some((group, name)) = selector.split_once('.') {
            return SCHEMA
                .iter()
                .find(|f| f.group.name() == group && f.name == name);
        }

        SCHEMA
            .iter()
            .find(|f| f.column == selector)
            .or_else(|| SCHEMA.iter().find(|f| f.name == selector))
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == selector)
                    .and_then(|(_, column)| SCHEMA.iter().find(|f| f.column == *column))
            })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.group.name(), self.name, self.column)
    }
}

use IndicatorGroup::{Consumption, Credit, Housing, Labor, Macro};

/// Every numeric indicator read from a CES row.
pub static SCHEMA: &[Field] = &[
    Field::new(Macro, "inflation_1y", "c4030"),
    Field::new(Macro, "inflation_3y", "c4031"),
    Field::new(Macro, "inflation_perception_12m", "c4010"),
    Field::new(Macro, "inflation_uncertainty", "c4020"),
    Field::new(Macro, "econ_growth_12m", "e2010"),
    Field::new(Macro, "interest_rate_exp", "e2020"),
    Field::new(Macro, "unemployment_percept", "c4032"),
    Field::new(Consumption, "income_growth", "c1150_1"),
    Field::new(Consumption, "spending_growth", "c1150_2"),
    Field::new(Consumption, "major_purchases_intent", "c1150_3"),
    Field::new(Consumption, "tax_exp", "c1150_4"),
    Field::new(Consumption, "public_svc_exp", "c1150_5"),
    Field::new(Consumption, "housing_costs_exp", "c1150_6"),
    Field::new(Consumption, "energy_exp", "c1150_7"),
    Field::new(Consumption, "food_exp", "c1150_8"),
    Field::new(Consumption, "savings_growth", "c1220"),
    Field::new(Labor, "job_loss_prob", "p1410_1"),
    Field::new(Labor, "job_find_prob", "p1410_2"),
    Field::new(Labor, "prob_working_after_70", "p1410_3"),
    Field::new(Labor, "prob_inc_increase", "p1410_4"),
    Field::new(Labor, "prob_leaving_labor_market", "p1410_5"),
    Field::new(Housing, "house_price_exp", "c3220"),
    Field::new(Housing, "buy_home_conditions", "c3210"),
    Field::new(Housing, "cash_savings", "c3250_1"),
    Field::new(Housing, "life_insurance", "c3250_2"),
    Field::new(Housing, "pension_funds", "c3250_3"),
    Field::new(Housing, "mutual_funds", "c3250_4"),
    Field::new(Housing, "public_bonds", "c3250_5"),
    Field::new(Housing, "corp_bonds", "c3250_6"),
    Field::new(Housing, "stocks", "c3250_7"),
    Field::new(Housing, "business_equity", "c3250_8"),
    Field::new(Housing, "crypto_assets", "c3251_9"),
    Field::new(Housing, "precious_metals", "c3251_10"),
    Field::new(Credit, "mortgage_access", "c8010_1"),
    Field::new(Credit, "consumer_credit_access", "c8010_2"),
    Field::new(Credit, "bank_loan_apply", "c8010_3"),
    Field::new(Credit, "credit_constraint_flag", "c8011_1"),
    Field::new(Credit, "repayment_increase_prob", "c8011_2"),
    Field::new(Credit, "loan_repayment_struggle", "c8011_3"),
    Field::new(Credit, "debt_level_expected", "c8011_4"),
    Field::new(Credit, "repayment_capacity", "c8011_5"),
];

/// Short names analysts use, mapped to column codes.
static ALIASES: &[(&str, &str)] = &[
    ("inflation", "c4030"),
    ("income", "c1150_1"),
    ("spending", "c1150_2"),
    ("food", "c1150_8"),
    ("energy", "c1150_7"),
    ("housing_costs", "c1150_6"),
    ("house_prices", "c3220"),
    ("savings", "c1220"),
    ("job_find", "p1410_2"),
    ("job_loss", "p1410_1"),
    ("stocks", "c3250_7"),
    ("mortgage", "c8010_1"),
    ("crypto", "c3251_9"),
];

/// Fields of one group, in schema order.
pub fn fields_in(group: IndicatorGroup) -> impl Iterator<Item = &'static Field> {
    SCHEMA.iter().filter(move |f| f.group == group)
}
