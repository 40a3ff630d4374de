use serde::Serialize;

/// Ticket sections the extractor may name and the resolver can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
	IssueSummary,
	IssueDescription,
	StepToReproduce,
}
impl Section {
	pub const ALL: [Self; 3] = [Self::IssueSummary, Self::IssueDescription, Self::StepToReproduce];

	pub fn label(self) -> &'static str {
		match self {
			Self::IssueSummary => "issue summary",
			Self::IssueDescription => "issue description",
			Self::StepToReproduce => "step to reproduce",
		}
	}

	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|section| section.label() == label)
	}
}

/// Vector index a section label is searched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBinding {
	Summary,
	Description,
	Step,
}
impl IndexBinding {
	/// Unrecognised labels fall back to the summary index.
	pub fn for_label(label: &str) -> Self {
		match Section::from_label(label) {
			Some(Section::IssueSummary) => Self::Summary,
			Some(Section::IssueDescription) => Self::Description,
			Some(Section::StepToReproduce) => Self::Step,
			None => Self::Summary,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Summary => "summary",
			Self::Description => "description",
			Self::Step => "step",
		}
	}

	pub fn collection(self, collections: &tkg_config::SectionCollections) -> &str {
		match self {
			Self::Summary => collections.summary.as_str(),
			Self::Description => collections.description.as_str(),
			Self::Step => collections.step.as_str(),
		}
	}
}
