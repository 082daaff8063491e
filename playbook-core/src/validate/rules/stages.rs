use crate::types::{Bundle, RequestRef, Stage};
use crate::validate::rules::content::validate_stage_content;
use crate::validate::validator::Validator;

pub(crate) fn validate_stage_list(v: &mut Validator, bundle: &Bundle, stages: &[Stage], path: &str) {
    for (idx, stage) in stages.iter().enumerate() {
        let spath = format!("{path}[{idx}]");
        match stage {
            Stage::Reference(r) => validate_reference(v, bundle, &r.reference, &spath),
            Stage::External(e) => validate_stage_content(v, bundle, &e.content, &spath),
        }
    }
}

fn validate_reference(v: &mut Validator, bundle: &Bundle, reference: &RequestRef, path: &str) {
    if bundle.has_target(reference) {
        return;
    }
    let message = match reference {
        RequestRef::Operation { id } => format!("references unknown operation '{id}'"),
        RequestRef::Request { id } => format!("references unknown request '{id}'"),
        RequestRef::Credential { id, .. } if bundle.credential(id).is_none() => {
            format!("references unknown credential '{id}'")
        }
        RequestRef::Credential { .. } => {
            format!("credential stage {reference} is out of range")
        }
    };
    v.push(format!("{path}.ref"), message);
}
