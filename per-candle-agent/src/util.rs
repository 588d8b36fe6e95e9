//! Utilities.
use anyhow::{anyhow, Context, Result};
use candle_core::{Tensor, Var};
use candle_nn::VarMap;
use std::{collections::HashMap, sync::MutexGuard};

fn lock(varmap: &VarMap) -> Result<MutexGuard<'_, HashMap<String, Var>>> {
    varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("Variables are locked by a panicked thread"))
}

/// Copies the variables of `src` into `dest`.
///
/// Variables are identified by their names.
pub fn copy_vars(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = lock(dest)?;
    let src = lock(src)?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .with_context(|| format!("Variable {} is not in the source", k_dest))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Returns the variable `name` of `varmap` as a tensor.
pub fn get_var(varmap: &VarMap, name: &str) -> Result<Tensor> {
    let data = lock(varmap)?;
    let var = data
        .get(name)
        .with_context(|| format!("No variable named {}", name))?;
    Ok(var.as_tensor().clone())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}
