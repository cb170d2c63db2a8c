//! Run configuration and the run directory layout.
//!
//! A run directory holds every input and output of a selection run:
//!
//! ```text
//! <run>/
//! ├── input/
//! │   ├── ODB/<symbol>.fasta, <symbol>.tsv
//! │   ├── NCBI/<ncbi_taxid>/<symbol>.fasta
//! │   └── aliases/<symbol>_aliases.txt
//! ├── output/<symbol>/<symbol>.fasta, <symbol>_msa.fasta, <symbol>_records.tsv
//! ├── summary/errors.tsv
//! └── manual_record_selections.tsv
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::align::ExternalAligner;

/// Settings for one selection run
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Run directory
    pub run_dir: PathBuf,

    /// NCBI taxonomy ID of the species whose NCBI records are selected
    pub ncbi_taxid: String,

    /// Scientific name of that species, as it appears in NCBI descriptions
    pub ncbi_tax_name: String,

    /// OrthoDB taxid the NCBI candidates are compared against
    pub odb_test_taxid: String,

    /// OrthoDB taxids kept from the raw OrthoDB tables
    pub tax_subset: Vec<String>,

    /// OrthoDB taxids selected first; other species are chosen against them
    pub known_species: Vec<String>,

    /// Alignment program, fed on stdin and read from stdout
    pub aligner: PathBuf,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aligner_args: Vec<String>,
}

impl RunConfig {
    /// Organism name to taxid mapping used when loading NCBI records
    #[must_use]
    pub fn taxid_map(&self) -> HashMap<String, String> {
        HashMap::from([(self.ncbi_tax_name.clone(), self.ncbi_taxid.clone())])
    }

    /// OrthoDB taxids NCBI candidates are measured against
    #[must_use]
    pub fn compare_taxids(&self) -> Vec<String> {
        vec![self.odb_test_taxid.clone()]
    }

    /// Known species, defaulting to the whole taxid subset when none are given
    #[must_use]
    pub fn known_species_or_subset(&self) -> &[String] {
        if self.known_species.is_empty() {
            &self.tax_subset
        } else {
            &self.known_species
        }
    }

    #[must_use]
    pub fn paths(&self) -> RunPaths {
        RunPaths::new(&self.run_dir, &self.ncbi_taxid)
    }

    #[must_use]
    pub fn aligner(&self) -> ExternalAligner {
        ExternalAligner::new(&self.aligner).with_args(self.aligner_args.iter().cloned())
    }
}

/// Input and output paths within a run directory
#[derive(Debug, Clone)]
pub struct RunPaths {
    root: PathBuf,
    ncbi_taxid: String,
}

impl RunPaths {
    pub fn new(root: impl Into<PathBuf>, ncbi_taxid: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ncbi_taxid: ncbi_taxid.into(),
        }
    }

    #[must_use]
    pub fn odb_fasta(&self, symbol: &str) -> PathBuf {
        self.root.join("input").join("ODB").join(format!("{symbol}.fasta"))
    }

    #[must_use]
    pub fn odb_tsv(&self, symbol: &str) -> PathBuf {
        self.root.join("input").join("ODB").join(format!("{symbol}.tsv"))
    }

    #[must_use]
    pub fn ncbi_fasta(&self, symbol: &str) -> PathBuf {
        self.root
            .join("input")
            .join("NCBI")
            .join(&self.ncbi_taxid)
            .join(format!("{symbol}.fasta"))
    }

    #[must_use]
    pub fn aliases(&self, symbol: &str) -> PathBuf {
        self.root
            .join("input")
            .join("aliases")
            .join(format!("{symbol}_aliases.txt"))
    }

    #[must_use]
    pub fn output_dir(&self, symbol: &str) -> PathBuf {
        self.root.join("output").join(symbol)
    }

    #[must_use]
    pub fn out_unaln_fasta(&self, symbol: &str) -> PathBuf {
        self.output_dir(symbol).join(format!("{symbol}.fasta"))
    }

    #[must_use]
    pub fn out_aln_fasta(&self, symbol: &str) -> PathBuf {
        self.output_dir(symbol).join(format!("{symbol}_msa.fasta"))
    }

    #[must_use]
    pub fn out_records_tsv(&self, symbol: &str) -> PathBuf {
        self.output_dir(symbol).join(format!("{symbol}_records.tsv"))
    }

    #[must_use]
    pub fn manual_selections(&self) -> PathBuf {
        self.root.join("manual_record_selections.tsv")
    }

    #[must_use]
    pub fn errors_tsv(&self) -> PathBuf {
        self.root.join("summary").join("errors.tsv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::DEFAULT_ALIGNER;

    fn config() -> RunConfig {
        RunConfig {
            run_dir: PathBuf::from("cDNAscreen_041020"),
            ncbi_taxid: "9999".to_string(),
            ncbi_tax_name: "Urocitellus parryii".to_string(),
            odb_test_taxid: "43179_0".to_string(),
            tax_subset: vec!["10090_0".to_string(), "43179_0".to_string(), "9606_0".to_string()],
            known_species: Vec::new(),
            aligner: PathBuf::from(DEFAULT_ALIGNER),
            aligner_args: Vec::new(),
        }
    }

    #[test]
    fn test_paths() {
        let paths = config().paths();
        assert_eq!(
            paths.odb_fasta("ATP5MC1"),
            PathBuf::from("cDNAscreen_041020/input/ODB/ATP5MC1.fasta")
        );
        assert_eq!(
            paths.ncbi_fasta("ATP5MC1"),
            PathBuf::from("cDNAscreen_041020/input/NCBI/9999/ATP5MC1.fasta")
        );
        assert_eq!(
            paths.out_aln_fasta("ATP5MC1"),
            PathBuf::from("cDNAscreen_041020/output/ATP5MC1/ATP5MC1_msa.fasta")
        );
        assert_eq!(
            paths.out_records_tsv("ATP5MC1"),
            PathBuf::from("cDNAscreen_041020/output/ATP5MC1/ATP5MC1_records.tsv")
        );
        assert_eq!(
            paths.manual_selections(),
            PathBuf::from("cDNAscreen_041020/manual_record_selections.tsv")
        );
    }

    #[test]
    fn test_taxid_map_and_known_species() {
        let mut cfg = config();
        assert_eq!(cfg.taxid_map()["Urocitellus parryii"], "9999");
        assert_eq!(cfg.compare_taxids(), vec!["43179_0".to_string()]);
        assert_eq!(cfg.known_species_or_subset().len(), 3);

        cfg.known_species = vec!["9606_0".to_string()];
        assert_eq!(cfg.known_species_or_subset(), &["9606_0".to_string()]);
    }
}
