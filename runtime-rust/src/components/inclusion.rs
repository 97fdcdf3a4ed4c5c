use kanon_validator::errors::*;

use kanon_validator::base::EncodedDataset;
use kanon_validator::components::Inclusion;

use crate::base::DataManager;
use crate::components::{Bind, Binding};

impl Bind for Inclusion {
    fn bind(&self, _dataset: &EncodedDataset, _manager: &DataManager) -> Result<Binding> {
        Ok(Binding::Subset)
    }
}
