use crate::crypto::{self, CanonicalError};
use serde::{Deserialize, Serialize};

/// What kind of artifact a skill is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    Skill,
    Content,
    Compute,
    Service,
}

/// A file as submitted by the creator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSkillFile {
    pub path: String,
    pub content: String,
}

/// A stored file: content plus its content hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFile {
    pub path: String,
    pub content: String,
    pub hash: String,
}

/// A file reference inside the manifest (path and content hash only)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub hash: String,
}

/// The canonical descriptor of a skill. Its canonical-JSON hash is the
/// skill's identity; files are listed in the creator's input order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillManifest {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    pub files: Vec<ManifestFile>,
    pub dependencies: Vec<String>,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
}

impl SkillManifest {
    /// The content-addressed identity of this manifest
    pub fn id(&self) -> Result<String, CanonicalError> {
        crypto::digest_hex(self)
    }
}

/// Everything submitted to create a skill
#[derive(Clone, Debug)]
pub struct SkillDraft {
    pub name: String,
    pub description: String,
    pub version: String,
    pub skill_type: SkillType,
    pub files: Vec<NewSkillFile>,
    pub dependencies: Vec<String>,
    pub license: String,
    pub entry_point: Option<String>,
}

/// A stored skill artifact: the manifest, the file contents backing it,
/// and the creator's public key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillArtifact {
    pub id: String,
    pub manifest: SkillManifest,
    pub files: Vec<SkillFile>,
    pub creator: String,
    pub created_at: u64,
}

impl SkillArtifact {
    /// Assemble an artifact from a draft, hashing every file and deriving
    /// the id from the manifest
    pub fn from_draft(
        draft: SkillDraft,
        creator: &str,
        created_at: u64,
    ) -> Result<Self, CanonicalError> {
        let files: Vec<SkillFile> = draft
            .files
            .into_iter()
            .map(|f| {
                let hash = crypto::sha256_hex(f.content.as_bytes());
                SkillFile {
                    path: f.path,
                    content: f.content,
                    hash,
                }
            })
            .collect();

        let manifest = SkillManifest {
            name: draft.name,
            description: draft.description,
            version: draft.version,
            skill_type: draft.skill_type,
            files: files
                .iter()
                .map(|f| ManifestFile {
                    path: f.path.clone(),
                    hash: f.hash.clone(),
                })
                .collect(),
            dependencies: draft.dependencies,
            license: draft.license,
            entry_point: draft.entry_point,
        };

        Ok(Self {
            id: manifest.id()?,
            manifest,
            files,
            creator: creator.to_string(),
            created_at,
        })
    }

    /// Recompute the manifest hash and every file hash from stored data.
    /// Any mismatch makes the artifact invalid.
    pub fn verify(&self) -> bool {
        match self.manifest.id() {
            Ok(id) if id == self.id => {}
            _ => return false,
        }

        if self.files.len() != self.manifest.files.len() {
            return false;
        }

        for (file, entry) in self.files.iter().zip(self.manifest.files.iter()) {
            if file.path != entry.path {
                return false;
            }
            let hash = crypto::sha256_hex(file.content.as_bytes());
            if hash != file.hash || hash != entry.hash {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SkillDraft {
        SkillDraft {
            name: "greeter".to_string(),
            description: "says hello".to_string(),
            version: "1.0.0".to_string(),
            skill_type: SkillType::Skill,
            files: vec![NewSkillFile {
                path: "index.js".to_string(),
                content: "x=1".to_string(),
            }],
            dependencies: Vec::new(),
            license: "MIT".to_string(),
            entry_point: Some("index.js".to_string()),
        }
    }

    #[test]
    fn test_id_is_manifest_hash() {
        let artifact = SkillArtifact::from_draft(draft(), &"aa".repeat(32), 1).unwrap();
        assert_eq!(artifact.id, artifact.manifest.id().unwrap());
        assert!(artifact.verify());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let mut artifact = SkillArtifact::from_draft(draft(), &"aa".repeat(32), 1).unwrap();
        artifact.files[0].content = "x=2".to_string();
        assert!(!artifact.verify());
    }

    #[test]
    fn test_tampered_manifest_fails_verification() {
        let mut artifact = SkillArtifact::from_draft(draft(), &"aa".repeat(32), 1).unwrap();
        artifact.manifest.name = "imposter".to_string();
        assert!(!artifact.verify());
    }

    #[test]
    fn test_same_draft_same_id() {
        let a = SkillArtifact::from_draft(draft(), &"aa".repeat(32), 1).unwrap();
        let b = SkillArtifact::from_draft(draft(), &"bb".repeat(32), 2).unwrap();
        // Identity is the manifest alone, not the creator or time.
        assert_eq!(a.id, b.id);
    }
}
