use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::LayerMode;

/// Ordered prompts belonging to one scoring category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrompts {
    pub name: String,
    pub prompts: Vec<String>,
}

/// Thematic group of categories presented together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDefinition {
    pub name: String,
    #[serde(default)]
    pub open_ended: bool,
    pub categories: Vec<CategoryPrompts>,
}

impl LayerDefinition {
    pub fn mode(&self) -> LayerMode {
        LayerMode::from_open_ended(self.open_ended)
    }

    pub fn prompt_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.prompts.len())
            .sum()
    }
}

/// Immutable question catalogue. Category names are unique across every layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCatalog {
    layers: Vec<LayerDefinition>,
}

impl QuestionCatalog {
    pub fn new(layers: Vec<LayerDefinition>) -> Result<Self, CatalogError> {
        if layers.is_empty() {
            return Err(CatalogError::Empty);
        }

        validate_layers(&layers)?;
        Ok(Self { layers })
    }

    pub fn standard() -> Self {
        Self {
            layers: standard_layers(),
        }
    }

    pub fn layers(&self) -> &[LayerDefinition] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&LayerDefinition> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn mode_of(&self, category: &str) -> Option<LayerMode> {
        self.layers
            .iter()
            .find(|layer| layer.categories.iter().any(|c| c.name == category))
            .map(LayerDefinition::mode)
    }

    /// Copy of the catalogue with each category's prompts shuffled and optionally
    /// capped at `limit`. Categories themselves are never dropped.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, limit: Option<usize>) -> Self {
        self.map_prompts(|prompts| {
            prompts.shuffle(&mut *rng);
            if let Some(limit) = limit {
                prompts.truncate(limit.max(1));
            }
        })
    }

    /// Copy keeping only the first `limit` prompts of each category, in catalogue order.
    pub fn truncated(&self, limit: usize) -> Self {
        self.map_prompts(|prompts| prompts.truncate(limit.max(1)))
    }

    fn map_prompts<F>(&self, mut edit: F) -> Self
    where
        F: FnMut(&mut Vec<String>),
    {
        let layers = self
            .layers
            .iter()
            .map(|layer| LayerDefinition {
                name: layer.name.clone(),
                open_ended: layer.open_ended,
                categories: layer
                    .categories
                    .iter()
                    .map(|category| {
                        let mut prompts = category.prompts.clone();
                        edit(&mut prompts);
                        CategoryPrompts {
                            name: category.name.clone(),
                            prompts,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { layers }
    }
}

/// Static category to career lookup consumed by the career mapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CareerMappingTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl CareerMappingTable {
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        let entries = STANDARD_CAREERS
            .iter()
            .map(|(category, careers)| {
                (
                    category.to_string(),
                    careers.iter().map(|career| career.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn careers_for(&self, category: &str) -> Option<&[String]> {
        self.entries.get(category).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Skills, outlook, demand, and salary band for one career.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerInsight {
    pub skills: Vec<String>,
    pub outlook: String,
    pub demand: String,
    pub salary_range: String,
}

impl CareerInsight {
    /// Placeholder for careers the insight table does not cover.
    pub fn unavailable() -> Self {
        Self {
            skills: vec!["N/A".to_string()],
            outlook: "N/A".to_string(),
            demand: "Unknown".to_string(),
            salary_range: "N/A".to_string(),
        }
    }
}

/// Market view of one recommended career. `listed` is false when the insight is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketInsight {
    pub career: String,
    pub listed: bool,
    #[serde(flatten)]
    pub insight: CareerInsight,
}

/// Static career to market-insight lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CareerInsightTable {
    entries: BTreeMap<String, CareerInsight>,
}

impl CareerInsightTable {
    pub fn new(entries: BTreeMap<String, CareerInsight>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        let entries = STANDARD_INSIGHTS
            .iter()
            .map(|(career, skills, outlook, demand, salary_range)| {
                (
                    career.to_string(),
                    CareerInsight {
                        skills: skills.iter().map(|skill| skill.to_string()).collect(),
                        outlook: outlook.to_string(),
                        demand: demand.to_string(),
                        salary_range: salary_range.to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, career: &str) -> Option<&CareerInsight> {
        self.entries.get(career)
    }

    pub fn describe(&self, career: &str) -> MarketInsight {
        match self.entries.get(career) {
            Some(insight) => MarketInsight {
                career: career.to_string(),
                listed: true,
                insight: insight.clone(),
            },
            None => MarketInsight {
                career: career.to_string(),
                listed: false,
                insight: CareerInsight::unavailable(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Catalogue, career table, and market insights travelling together, loadable from a
/// single JSON document.
#[derive(Debug, Clone)]
pub struct AssessmentBlueprint {
    pub catalog: QuestionCatalog,
    pub careers: CareerMappingTable,
    pub insights: CareerInsightTable,
}

#[derive(Debug, Deserialize)]
struct BlueprintDocument {
    layers: Vec<LayerDefinition>,
    #[serde(default)]
    careers: Option<CareerMappingTable>,
    #[serde(default)]
    insights: Option<CareerInsightTable>,
}

impl AssessmentBlueprint {
    pub fn standard() -> Self {
        Self {
            catalog: QuestionCatalog::standard(),
            careers: CareerMappingTable::standard(),
            insights: CareerInsightTable::standard(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a JSON blueprint. Missing `careers` or `insights` fall back to the standard tables.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let document: BlueprintDocument = serde_json::from_reader(reader)?;
        let catalog = QuestionCatalog::new(document.layers)?;
        let careers = document
            .careers
            .unwrap_or_else(CareerMappingTable::standard);
        let insights = document
            .insights
            .unwrap_or_else(CareerInsightTable::standard);
        Ok(Self {
            catalog,
            careers,
            insights,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog defines no layers")]
    Empty,
    #[error("layer '{0}' defines no categories")]
    EmptyLayer(String),
    #[error("category '{0}' defines no prompts")]
    EmptyCategory(String),
    #[error("category '{0}' appears more than once")]
    DuplicateCategory(String),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),
}

fn validate_layers(layers: &[LayerDefinition]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for layer in layers {
        if layer.categories.is_empty() {
            return Err(CatalogError::EmptyLayer(layer.name.clone()));
        }
        for category in &layer.categories {
            if category.prompts.is_empty() {
                return Err(CatalogError::EmptyCategory(category.name.clone()));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }
        }
    }
    Ok(())
}

fn category(name: &str, prompts: &[&str]) -> CategoryPrompts {
    CategoryPrompts {
        name: name.to_string(),
        prompts: prompts.iter().map(|prompt| prompt.to_string()).collect(),
    }
}

fn standard_layers() -> Vec<LayerDefinition> {
    vec![
        LayerDefinition {
            name: "Core Intelligence & Cognitive Style".to_string(),
            open_ended: false,
            categories: vec![
                category(
                    "Linguistic",
                    &[
                        "I enjoy writing essays, stories, or journal entries for fun.",
                        "I find it easy to explain complex topics in simple terms.",
                        "I like to express my ideas clearly through written or spoken communication.",
                    ],
                ),
                category(
                    "Logical-Mathematical",
                    &[
                        "I enjoy solving logical puzzles, riddles, or brain teasers.",
                        "I analyze data, statistics, or numerical trends to make decisions.",
                        "I easily identify patterns and relationships in data or concepts.",
                    ],
                ),
                category(
                    "Interpersonal",
                    &[
                        "I enjoy working in teams and collaborating with peers on projects.",
                        "I am good at resolving conflicts between friends or classmates.",
                        "I understand and respond well to people's emotions and perspectives.",
                    ],
                ),
                category(
                    "Intrapersonal",
                    &[
                        "I regularly reflect on my personal strengths and weaknesses.",
                        "I set clear personal and academic goals for myself.",
                        "I stay motivated and disciplined even when studying independently.",
                    ],
                ),
                category(
                    "Naturalistic",
                    &[
                        "I enjoy studying environmental topics like sustainability, ecology, or agriculture.",
                        "I like spending time in nature and observing patterns in the environment.",
                        "I connect academic subjects with real-world applications in nature and science.",
                    ],
                ),
                category(
                    "Bodily-Kinesthetic",
                    &[
                        "I enjoy physical activities like sports, dance, or acting.",
                        "I learn better by doing rather than just reading or listening.",
                        "I like building things with my hands or tools.",
                    ],
                ),
                category(
                    "Musical",
                    &[
                        "I can identify or reproduce musical patterns easily.",
                        "I enjoy listening to or creating music.",
                        "I can differentiate tones, pitches, and instruments.",
                    ],
                ),
                category(
                    "Spatial",
                    &[
                        "I enjoy drawing, painting, or visual designing.",
                        "I can visualize objects from different angles in my mind.",
                        "I often think in pictures rather than words.",
                    ],
                ),
                category(
                    "Cognitive Styles",
                    &[
                        "I prefer visual materials (diagrams, flowcharts) when learning new things.",
                        "I tend to think in words and prefer reading or writing to learn.",
                        "I like learning by doing and engaging in hands-on tasks.",
                    ],
                ),
            ],
        },
        LayerDefinition {
            name: "Personality & Motivation".to_string(),
            open_ended: false,
            categories: vec![
                category(
                    "Big Five - Openness",
                    &[
                        "I enjoy trying new and different activities.",
                        "I am imaginative and full of ideas.",
                        "I appreciate art, music, and literature.",
                    ],
                ),
                category(
                    "Big Five - Conscientiousness",
                    &[
                        "I like to keep things organized and tidy.",
                        "I follow through with tasks and responsibilities.",
                    ],
                ),
                category(
                    "Big Five - Extraversion",
                    &[
                        "I feel comfortable in social situations.",
                        "I enjoy being the center of attention.",
                    ],
                ),
                category(
                    "Big Five - Agreeableness",
                    &[
                        "I am considerate and kind to almost everyone.",
                        "I try to see things from others' perspectives.",
                    ],
                ),
                category(
                    "SDT - Autonomy",
                    &[
                        "I feel free to choose how to approach my work or study.",
                        "I enjoy tasks more when I have control over them.",
                    ],
                ),
                category(
                    "SDT - Competence",
                    &[
                        "I feel capable and effective in what I do.",
                        "I take pride in mastering new skills or challenges.",
                    ],
                ),
            ],
        },
        LayerDefinition {
            name: "Aptitude & Skill Assessment".to_string(),
            open_ended: false,
            categories: vec![
                category(
                    "Numerical Aptitude",
                    &[
                        "I am comfortable working with numbers and data.",
                        "I can solve arithmetic and algebraic problems easily.",
                        "I enjoy tasks involving statistics, accounting, or finance.",
                    ],
                ),
                category(
                    "Abstract Reasoning",
                    &[
                        "I can spot logical patterns in unfamiliar problems.",
                        "I can mentally manipulate shapes and figures.",
                        "I solve visual puzzles and reasoning questions with ease.",
                    ],
                ),
                category(
                    "Technical Skills",
                    &[
                        "I have experience with software/tools relevant to my field.",
                        "I can troubleshoot or learn new technical skills quickly.",
                        "I understand technical manuals, processes, or systems.",
                    ],
                ),
                category(
                    "Creative/Design Skills",
                    &[
                        "I can generate original ideas and solutions.",
                        "I am skilled at sketching, designing, or multimedia work.",
                        "I enjoy innovating in visual or artistic formats.",
                    ],
                ),
                category(
                    "Communication Skills",
                    &[
                        "I express my ideas clearly in speaking or writing.",
                        "I adapt my message to suit the audience.",
                        "I am persuasive and confident in presentations.",
                    ],
                ),
            ],
        },
        LayerDefinition {
            name: "Background, Context & Exposure".to_string(),
            open_ended: false,
            categories: vec![
                category(
                    "Educational Background",
                    &[
                        "I have access to quality academic resources (books, teachers, labs).",
                        "My academic environment encourages exploration and innovation.",
                    ],
                ),
                category(
                    "Socioeconomic Factors",
                    &[
                        "I have access to stable internet, computer, and other learning tools.",
                        "My family can support me in pursuing higher education or specialized training.",
                    ],
                ),
                category(
                    "Career Exposure",
                    &[
                        "I have interacted with professionals from various career paths.",
                        "I have participated in internships, shadowing, or volunteering roles.",
                    ],
                ),
            ],
        },
        LayerDefinition {
            name: "Real-world Alignment".to_string(),
            open_ended: false,
            categories: vec![
                category(
                    "Interests and Passions",
                    &[
                        "I have clear hobbies or subjects that I love spending time on.",
                        "I get excited about working on personal or creative projects.",
                    ],
                ),
                category(
                    "Career Trends Awareness",
                    &[
                        "I am aware of new and emerging fields in the job market.",
                        "I regularly explore how careers are evolving with technology and globalization.",
                    ],
                ),
                category(
                    "Personal Goals and Values",
                    &[
                        "My career decisions are guided by my personal values.",
                        "I think about the impact I want to create through my work.",
                    ],
                ),
            ],
        },
        LayerDefinition {
            name: "Synthesis & Career Mapping".to_string(),
            open_ended: true,
            categories: vec![
                category(
                    "Self Synthesis",
                    &[
                        "Based on my intelligence strengths, the types of activities I naturally enjoy are:",
                        "The industries and roles that excite me most are:",
                        "My top 3 career interest areas are:",
                    ],
                ),
                category(
                    "Action Plan",
                    &[
                        "What are 3 things you can do in the next 30 days to explore your top choice(s)?",
                        "What specific skills or knowledge gaps do you need to address?",
                    ],
                ),
            ],
        },
    ]
}

const STANDARD_CAREERS: &[(&str, &[&str])] = &[
    (
        "Linguistic",
        &["Journalism", "Content Writing", "Law", "Public Relations", "Teaching"],
    ),
    (
        "Logical-Mathematical",
        &["Data Science", "Engineering", "Finance", "Research", "Software Development"],
    ),
    (
        "Spatial",
        &["Graphic Design", "Architecture", "UX Design", "Animation", "Cartography"],
    ),
    (
        "Bodily-Kinesthetic",
        &["Sports Coaching", "Physical Therapy", "Dance", "Carpentry", "Surgery"],
    ),
    (
        "Interpersonal",
        &["Human Resources", "Psychology", "Social Work", "Marketing", "Counseling"],
    ),
    (
        "Intrapersonal",
        &["Entrepreneur", "Researcher", "Philosopher", "Author", "Career Consultant"],
    ),
    (
        "Naturalistic",
        &[
            "Environmental Science",
            "Forestry",
            "Agriculture",
            "Wildlife Conservation",
            "Geology",
        ],
    ),
    (
        "Musical",
        &[
            "Music Production",
            "Sound Engineering",
            "Music Therapy",
            "Performing Arts",
            "Composer",
        ],
    ),
    (
        "Abstract Reasoning",
        &["Data Analysis", "Policy Analysis", "Academic Research", "Management Consulting"],
    ),
    (
        "Creative/Design Skills",
        &["Content Creator", "Graphic Designer", "Filmmaker", "Game Design"],
    ),
    (
        "Technical Skills",
        &["Software Engineer", "AI Specialist", "Cybersecurity Analyst"],
    ),
    (
        "Numerical Aptitude",
        &["Data Scientist", "Research Scientist", "Financial Analyst"],
    ),
    (
        "Communication Skills",
        &["Advertising", "Sales", "Public Relations", "Teaching"],
    ),
    (
        "Personal Goals and Values",
        &["Nonprofit Management", "Environmental Advocacy", "Public Health"],
    ),
];

type InsightRow = (&'static str, &'static [&'static str], &'static str, &'static str, &'static str);

const STANDARD_INSIGHTS: &[InsightRow] = &[
    (
        "Data Science",
        &["Python", "Statistics"],
        "High demand, growing field",
        "High",
        "$80k-$120k",
    ),
    (
        "Journalism",
        &["Writing", "Research"],
        "Moderate demand, competitive",
        "Moderate",
        "$40k-$70k",
    ),
    (
        "Software Development",
        &["Coding", "Problem-solving"],
        "Stable, high demand",
        "High",
        "$90k-$130k",
    ),
    (
        "Teaching",
        &["Communication", "Patience"],
        "Stable, consistent need",
        "Stable",
        "$40k-$60k",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    #[test]
    fn standard_catalog_passes_validation() {
        let standard = QuestionCatalog::standard();
        let rebuilt = QuestionCatalog::new(standard.layers().to_vec()).expect("standard is valid");
        assert_eq!(rebuilt.layers().len(), 6);
        assert_eq!(
            rebuilt.mode_of("Self Synthesis"),
            Some(LayerMode::OpenEnded)
        );
        assert_eq!(rebuilt.mode_of("Linguistic"), Some(LayerMode::Likert));
        assert_eq!(rebuilt.mode_of("Unknown"), None);
    }

    #[test]
    fn standard_career_keys_exist_in_catalog() {
        let catalog = QuestionCatalog::standard();
        for (category, _) in STANDARD_CAREERS {
            assert_eq!(
                catalog.mode_of(category),
                Some(LayerMode::Likert),
                "{category} should be a Likert category"
            );
        }
    }

    #[test]
    fn rejects_duplicate_categories_across_layers() {
        let layers = vec![
            LayerDefinition {
                name: "One".to_string(),
                open_ended: false,
                categories: vec![category("A", &["q1"])],
            },
            LayerDefinition {
                name: "Two".to_string(),
                open_ended: true,
                categories: vec![category("A", &["q2"])],
            },
        ];

        match QuestionCatalog::new(layers) {
            Err(CatalogError::DuplicateCategory(name)) => assert_eq!(name, "A"),
            other => panic!("expected duplicate category error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_categories_without_prompts() {
        let layers = vec![LayerDefinition {
            name: "One".to_string(),
            open_ended: false,
            categories: vec![category("A", &[])],
        }];
        assert!(matches!(
            QuestionCatalog::new(layers),
            Err(CatalogError::EmptyCategory(_))
        ));
    }

    #[test]
    fn sample_keeps_categories_and_caps_prompts() {
        let catalog = QuestionCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let sampled = catalog.sample(&mut rng, Some(2));

        assert_eq!(sampled.layers().len(), catalog.layers().len());
        for (original, sampled) in catalog.layers().iter().zip(sampled.layers()) {
            assert_eq!(original.categories.len(), sampled.categories.len());
            for (before, after) in original.categories.iter().zip(&sampled.categories) {
                assert_eq!(before.name, after.name);
                assert_eq!(after.prompts.len(), before.prompts.len().min(2));
                assert!(after.prompts.iter().all(|p| before.prompts.contains(p)));
            }
        }
    }

    #[test]
    fn truncated_keeps_catalog_order() {
        let catalog = QuestionCatalog::standard();
        let truncated = catalog.truncated(1);
        let original = &catalog.layers()[0].categories[0];
        let kept = &truncated.layers()[0].categories[0];
        assert_eq!(kept.prompts, vec![original.prompts[0].clone()]);
        assert_eq!(
            truncated.truncated(0).layers()[0].categories[0].prompts.len(),
            1,
            "a category always keeps at least one prompt"
        );
    }

    #[test]
    fn blueprint_document_defaults_to_standard_careers() {
        let json = r#"{
            "layers": [
                {"name": "Only", "categories": [{"name": "Linguistic", "prompts": ["q"]}]}
            ]
        }"#;
        let blueprint = AssessmentBlueprint::from_reader(Cursor::new(json)).expect("parses");
        assert_eq!(blueprint.catalog.mode_of("Linguistic"), Some(LayerMode::Likert));
        assert_eq!(blueprint.careers, CareerMappingTable::standard());
        assert_eq!(blueprint.insights, CareerInsightTable::standard());
    }

    #[test]
    fn insight_lookup_describes_known_careers() {
        let insight = CareerInsightTable::standard().describe("Data Science");
        assert!(insight.listed);
        assert_eq!(insight.insight.skills, vec!["Python", "Statistics"]);
        assert_eq!(insight.insight.demand, "High");
        assert_eq!(insight.insight.salary_range, "$80k-$120k");
        assert_eq!(insight.insight.outlook, "High demand, growing field");
    }

    #[test]
    fn insight_lookup_falls_back_to_placeholder() {
        let insight = CareerInsightTable::standard().describe("Cartography");
        assert_eq!(insight.career, "Cartography");
        assert!(!insight.listed);
        assert_eq!(insight.insight, CareerInsight::unavailable());
        assert_eq!(insight.insight.skills, vec!["N/A"]);
        assert_eq!(insight.insight.demand, "Unknown");
    }

    #[test]
    fn standard_insights_cover_mapped_careers() {
        let careers = CareerMappingTable::standard();
        let insights = CareerInsightTable::standard();
        for (career, _, _, _, _) in STANDARD_INSIGHTS {
            assert!(insights.get(career).is_some());
            assert!(
                careers.entries.values().flatten().any(|mapped| mapped == career),
                "{career} should be reachable from the career table"
            );
        }
    }

    #[test]
    fn blueprint_document_with_custom_careers() {
        let json = r#"{
            "layers": [
                {"name": "Only", "open_ended": false,
                 "categories": [{"name": "A", "prompts": ["q"]}]}
            ],
            "careers": {"A": ["X", "Y"]},
            "insights": {
                "X": {"skills": ["Focus"], "outlook": "Growing",
                      "demand": "High", "salary_range": "$1-$2"}
            }
        }"#;
        let blueprint = AssessmentBlueprint::from_reader(Cursor::new(json)).expect("parses");
        assert_eq!(
            blueprint.careers.careers_for("A"),
            Some(&["X".to_string(), "Y".to_string()][..])
        );
        assert!(blueprint.insights.describe("X").listed);
        assert!(!blueprint.insights.describe("Y").listed);
    }
}
