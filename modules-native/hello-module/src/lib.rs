//! Minimal hot-update module: proves the delivery pipeline end to end by
//! printing a greeting from inside the activated module.

use hotmod_module_api::HM_OK;

fn run() -> i32 {
    println!("hello from the hot-update module");
    HM_OK
}

hotmod_module_api::export_module_entry!(run);
