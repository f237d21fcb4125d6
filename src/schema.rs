use serde::{Deserialize, Serialize};
use validator::Validate;

/// Label column of the training table
pub const LABEL_COLUMN: &str = "Diagnosis";

/// Columns stripped from the training table before fitting.
///
/// Identifier and free-text quality scores are never predictive; `GFR` and
/// `TimeToEventMonths` are outcome-adjacent and would leak the target. `GFR`
/// is still accepted on requests, where it is used for KDIGO staging only.
pub const COLUMNS_TO_DROP: &[&str] = &[
    "PatientID",
    "DoctorInCharge",
    "DietQuality",
    "SleepQuality",
    "WaterQuality",
    "QualityOfLifeScore",
    "GFR",
    "TimeToEventMonths",
];

/// Historical short names mapped to the canonical column names of the
/// training table. Applied to every request before reconciliation so only
/// one spelling flows downstream.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[("BUN", "BUNLevels"), ("Fatigue", "FatigueLevels")];

/// Resolve a request field name to its canonical column name.
pub fn canonical_name(name: &str) -> &str {
    for (alias, canonical) in COLUMN_ALIASES {
        if *alias == name {
            return canonical;
        }
    }
    name
}

/// Patient data for a risk assessment request.
///
/// Fixed, versioned clinical schema. Every field carries a clinically
/// reasonable default so partial records from upstream gap-filling
/// deserialize cleanly; unknown extra fields are ignored at the JSON
/// boundary. Binary flags are 0/1.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PatientRecord {
    // Demographics
    #[serde(rename = "Age")]
    #[validate(range(min = 0, max = 120))]
    pub age: u32,

    /// 0 = male, 1 = female
    #[serde(rename = "Gender")]
    #[validate(range(min = 0, max = 1))]
    pub gender: u8,

    #[serde(rename = "Ethnicity")]
    #[validate(range(min = 0, max = 4))]
    pub ethnicity: u8,

    #[serde(rename = "SocioeconomicStatus")]
    #[validate(range(min = 0, max = 2))]
    pub socioeconomic_status: u8,

    #[serde(rename = "EducationLevel")]
    #[validate(range(min = 0, max = 3))]
    pub education_level: u8,

    // Lifestyle
    #[serde(rename = "BMI")]
    #[validate(range(min = 10.0, max = 60.0))]
    pub bmi: f64,

    #[serde(rename = "Smoking")]
    #[validate(range(min = 0, max = 1))]
    pub smoking: u8,

    #[serde(rename = "AlcoholConsumption")]
    #[validate(range(min = 0.0))]
    pub alcohol_consumption: f64,

    #[serde(rename = "PhysicalActivity")]
    #[validate(range(min = 0.0))]
    pub physical_activity: f64,

    // Family history
    #[serde(rename = "FamilyHistoryKidneyDisease")]
    #[validate(range(min = 0, max = 1))]
    pub family_history_kidney_disease: u8,

    #[serde(rename = "FamilyHistoryHypertension")]
    #[validate(range(min = 0, max = 1))]
    pub family_history_hypertension: u8,

    #[serde(rename = "FamilyHistoryDiabetes")]
    #[validate(range(min = 0, max = 1))]
    pub family_history_diabetes: u8,

    // Personal history
    #[serde(rename = "HistoryDiabetes")]
    #[validate(range(min = 0, max = 1))]
    pub history_diabetes: u8,

    #[serde(rename = "HistoryCHD")]
    #[validate(range(min = 0, max = 1))]
    pub history_chd: u8,

    #[serde(rename = "HistoryVascular")]
    #[validate(range(min = 0, max = 1))]
    pub history_vascular: u8,

    #[serde(rename = "HistoryHTN")]
    #[validate(range(min = 0, max = 1))]
    pub history_htn: u8,

    #[serde(rename = "HistoryDLD")]
    #[validate(range(min = 0, max = 1))]
    pub history_dld: u8,

    #[serde(rename = "HistoryObesity")]
    #[validate(range(min = 0, max = 1))]
    pub history_obesity: u8,

    #[serde(rename = "PreviousAcuteKidneyInjury")]
    #[validate(range(min = 0, max = 1))]
    pub previous_acute_kidney_injury: u8,

    #[serde(rename = "UrinaryTractInfections")]
    #[validate(range(min = 0, max = 1))]
    pub urinary_tract_infections: u8,

    // Vital signs
    /// Systolic blood pressure, mmHg
    #[serde(rename = "SystolicBP")]
    #[validate(range(min = 60, max = 250))]
    pub systolic_bp: u16,

    /// Diastolic blood pressure, mmHg
    #[serde(rename = "DiastolicBP")]
    #[validate(range(min = 40, max = 150))]
    pub diastolic_bp: u16,

    // Glycemia
    #[serde(rename = "FastingBloodSugar")]
    #[validate(range(min = 40.0, max = 500.0))]
    pub fasting_blood_sugar: f64,

    #[serde(rename = "HbA1c")]
    #[validate(range(min = 3.0, max = 15.0))]
    pub hba1c: f64,

    // Kidney function
    /// mg/dL
    #[serde(rename = "SerumCreatinine")]
    #[validate(range(min = 0.1, max = 20.0))]
    pub serum_creatinine: f64,

    /// Blood urea nitrogen, mg/dL. Accepts the short name `BUN`.
    #[serde(rename = "BUNLevels", alias = "BUN")]
    #[validate(range(min = 1.0, max = 150.0))]
    pub bun_levels: f64,

    /// Estimated GFR, mL/min/1.73m². Used for KDIGO staging of the
    /// response; never part of the model's feature space.
    #[serde(rename = "GFR")]
    #[validate(range(min = 1.0, max = 150.0))]
    pub gfr: f64,

    /// g/L; pathological extremes permitted
    #[serde(rename = "ProteinInUrine")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub protein_in_urine: f64,

    #[serde(rename = "ACR")]
    #[validate(range(min = 0.0, max = 5000.0))]
    pub acr: f64,

    // Electrolytes
    #[serde(rename = "SerumElectrolytesSodium")]
    pub serum_electrolytes_sodium: f64,

    #[serde(rename = "SerumElectrolytesPotassium")]
    pub serum_electrolytes_potassium: f64,

    #[serde(rename = "SerumElectrolytesCalcium")]
    pub serum_electrolytes_calcium: f64,

    #[serde(rename = "SerumElectrolytesPhosphorus")]
    pub serum_electrolytes_phosphorus: f64,

    // Hematology
    #[serde(rename = "HemoglobinLevels")]
    pub hemoglobin_levels: f64,

    // Lipid panel
    #[serde(rename = "CholesterolTotal")]
    pub cholesterol_total: f64,

    #[serde(rename = "CholesterolLDL")]
    pub cholesterol_ldl: f64,

    #[serde(rename = "CholesterolHDL")]
    pub cholesterol_hdl: f64,

    #[serde(rename = "CholesterolTriglycerides")]
    pub cholesterol_triglycerides: f64,

    // Medication
    #[serde(rename = "ACEInhibitors")]
    #[validate(range(min = 0, max = 1))]
    pub ace_inhibitors: u8,

    #[serde(rename = "Diuretics")]
    #[validate(range(min = 0, max = 1))]
    pub diuretics: u8,

    #[serde(rename = "HTNmeds")]
    #[validate(range(min = 0, max = 1))]
    pub htn_meds: u8,

    #[serde(rename = "NSAIDsUse")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub nsaids_use: f64,

    #[serde(rename = "Statins")]
    #[validate(range(min = 0, max = 1))]
    pub statins: u8,

    #[serde(rename = "AntidiabeticMedications")]
    #[validate(range(min = 0, max = 1))]
    pub antidiabetic_medications: u8,

    // Symptoms
    #[serde(rename = "Edema")]
    #[validate(range(min = 0, max = 1))]
    pub edema: u8,

    /// Accepts the short name `Fatigue`
    #[serde(rename = "FatigueLevels", alias = "Fatigue")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub fatigue_levels: f64,

    #[serde(rename = "NauseaVomiting")]
    #[validate(range(min = 0, max = 1))]
    pub nausea_vomiting: u8,

    #[serde(rename = "MuscleCramps")]
    #[validate(range(min = 0, max = 1))]
    pub muscle_cramps: u8,

    #[serde(rename = "Itching")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub itching: f64,

    // Exposures
    #[serde(rename = "HeavyMetalsExposure")]
    #[validate(range(min = 0, max = 1))]
    pub heavy_metals_exposure: u8,

    #[serde(rename = "OccupationalExposureChemicals")]
    #[validate(range(min = 0, max = 1))]
    pub occupational_exposure_chemicals: u8,

    // Care engagement
    #[serde(rename = "MedicalCheckupsFrequency")]
    #[validate(range(min = 0.0, max = 12.0))]
    pub medical_checkups_frequency: f64,

    #[serde(rename = "MedicationAdherence")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub medication_adherence: f64,

    #[serde(rename = "HealthLiteracy")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub health_literacy: f64,
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self {
            age: 50,
            gender: 0,
            ethnicity: 3,
            socioeconomic_status: 1,
            education_level: 1,
            bmi: 25.0,
            smoking: 0,
            alcohol_consumption: 0.0,
            physical_activity: 2.0,
            family_history_kidney_disease: 0,
            family_history_hypertension: 0,
            family_history_diabetes: 0,
            history_diabetes: 0,
            history_chd: 0,
            history_vascular: 0,
            history_htn: 0,
            history_dld: 0,
            history_obesity: 0,
            previous_acute_kidney_injury: 0,
            urinary_tract_infections: 0,
            systolic_bp: 120,
            diastolic_bp: 80,
            fasting_blood_sugar: 90.0,
            hba1c: 5.5,
            serum_creatinine: 1.0,
            bun_levels: 15.0,
            gfr: 90.0,
            protein_in_urine: 0.0,
            acr: 15.0,
            serum_electrolytes_sodium: 140.0,
            serum_electrolytes_potassium: 4.5,
            serum_electrolytes_calcium: 9.5,
            serum_electrolytes_phosphorus: 3.5,
            hemoglobin_levels: 14.0,
            cholesterol_total: 200.0,
            cholesterol_ldl: 100.0,
            cholesterol_hdl: 50.0,
            cholesterol_triglycerides: 150.0,
            ace_inhibitors: 0,
            diuretics: 0,
            htn_meds: 0,
            nsaids_use: 0.0,
            statins: 0,
            antidiabetic_medications: 0,
            edema: 0,
            fatigue_levels: 0.0,
            nausea_vomiting: 0,
            muscle_cramps: 0,
            itching: 0.0,
            heavy_metals_exposure: 0,
            occupational_exposure_chemicals: 0,
            medical_checkups_frequency: 1.0,
            medication_adherence: 5.0,
            health_literacy: 5.0,
        }
    }
}

impl PatientRecord {
    /// Flatten into canonical (column name, value) pairs for reconciliation
    /// against a fitted column layout.
    pub fn to_feature_pairs(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Age", self.age as f64),
            ("Gender", self.gender as f64),
            ("Ethnicity", self.ethnicity as f64),
            ("SocioeconomicStatus", self.socioeconomic_status as f64),
            ("EducationLevel", self.education_level as f64),
            ("BMI", self.bmi),
            ("Smoking", self.smoking as f64),
            ("AlcoholConsumption", self.alcohol_consumption),
            ("PhysicalActivity", self.physical_activity),
            (
                "FamilyHistoryKidneyDisease",
                self.family_history_kidney_disease as f64,
            ),
            (
                "FamilyHistoryHypertension",
                self.family_history_hypertension as f64,
            ),
            ("FamilyHistoryDiabetes", self.family_history_diabetes as f64),
            ("HistoryDiabetes", self.history_diabetes as f64),
            ("HistoryCHD", self.history_chd as f64),
            ("HistoryVascular", self.history_vascular as f64),
            ("HistoryHTN", self.history_htn as f64),
            ("HistoryDLD", self.history_dld as f64),
            ("HistoryObesity", self.history_obesity as f64),
            (
                "PreviousAcuteKidneyInjury",
                self.previous_acute_kidney_injury as f64,
            ),
            (
                "UrinaryTractInfections",
                self.urinary_tract_infections as f64,
            ),
            ("SystolicBP", self.systolic_bp as f64),
            ("DiastolicBP", self.diastolic_bp as f64),
            ("FastingBloodSugar", self.fasting_blood_sugar),
            ("HbA1c", self.hba1c),
            ("SerumCreatinine", self.serum_creatinine),
            ("BUNLevels", self.bun_levels),
            ("GFR", self.gfr),
            ("ProteinInUrine", self.protein_in_urine),
            ("ACR", self.acr),
            ("SerumElectrolytesSodium", self.serum_electrolytes_sodium),
            (
                "SerumElectrolytesPotassium",
                self.serum_electrolytes_potassium,
            ),
            ("SerumElectrolytesCalcium", self.serum_electrolytes_calcium),
            (
                "SerumElectrolytesPhosphorus",
                self.serum_electrolytes_phosphorus,
            ),
            ("HemoglobinLevels", self.hemoglobin_levels),
            ("CholesterolTotal", self.cholesterol_total),
            ("CholesterolLDL", self.cholesterol_ldl),
            ("CholesterolHDL", self.cholesterol_hdl),
            (
                "CholesterolTriglycerides",
                self.cholesterol_triglycerides,
            ),
            ("ACEInhibitors", self.ace_inhibitors as f64),
            ("Diuretics", self.diuretics as f64),
            ("HTNmeds", self.htn_meds as f64),
            ("NSAIDsUse", self.nsaids_use),
            ("Statins", self.statins as f64),
            (
                "AntidiabeticMedications",
                self.antidiabetic_medications as f64,
            ),
            ("Edema", self.edema as f64),
            ("FatigueLevels", self.fatigue_levels),
            ("NauseaVomiting", self.nausea_vomiting as f64),
            ("MuscleCramps", self.muscle_cramps as f64),
            ("Itching", self.itching),
            ("HeavyMetalsExposure", self.heavy_metals_exposure as f64),
            (
                "OccupationalExposureChemicals",
                self.occupational_exposure_chemicals as f64,
            ),
            (
                "MedicalCheckupsFrequency",
                self.medical_checkups_frequency,
            ),
            ("MedicationAdherence", self.medication_adherence),
            ("HealthLiteracy", self.health_literacy),
        ]
    }
}

/// KDIGO GFR stage derived from the submitted eGFR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GfrStage {
    G1,
    G2,
    G3a,
    G3b,
    G4,
    G5,
}

impl GfrStage {
    /// Classify an eGFR value (mL/min/1.73m²) into its KDIGO stage
    pub fn from_gfr(gfr: f64) -> Self {
        if gfr >= 90.0 {
            GfrStage::G1
        } else if gfr >= 60.0 {
            GfrStage::G2
        } else if gfr >= 45.0 {
            GfrStage::G3a
        } else if gfr >= 30.0 {
            GfrStage::G3b
        } else if gfr >= 15.0 {
            GfrStage::G4
        } else {
            GfrStage::G5
        }
    }
}

impl std::fmt::Display for GfrStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GfrStage::G1 => write!(f, "G1"),
            GfrStage::G2 => write!(f, "G2"),
            GfrStage::G3a => write!(f, "G3a"),
            GfrStage::G3b => write!(f, "G3b"),
            GfrStage::G4 => write!(f, "G4"),
            GfrStage::G5 => write!(f, "G5"),
        }
    }
}

/// Qualitative risk level derived from the predicted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}
