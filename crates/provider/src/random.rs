//! Random - a random alphanumeric string of a given length

use declarative::{
    ApplyContext, CheckFailure, CheckResponse, CustomResource, Error, PropertyMap, PropertySpec,
    PropertyType, PropertyValue, ResourceSchema, Result, check_inputs,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomArgs {
    pub length: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomState {
    pub length: i64,
    pub result: String,
}

/// Longest string `Random` will generate
pub const MAX_LENGTH: i64 = 4096;

/// Generates its string once; changing `length` replaces it
pub struct Random;

fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

impl CustomResource for Random {
    type Args = RandomArgs;
    type State = RandomState;
    const TYPE_NAME: &'static str = "Random";

    fn schema(&self) -> ResourceSchema {
        ResourceSchema {
            description: "A random alphanumeric string".into(),
            inputs: vec![
                PropertySpec::new("length", PropertyType::Integer)
                    .required()
                    .describe("Number of characters to generate"),
            ],
            outputs: vec![
                PropertySpec::new("length", PropertyType::Integer).required(),
                PropertySpec::new("result", PropertyType::String)
                    .computed()
                    .describe("The generated string"),
            ],
        }
    }

    fn check(
        &self,
        _ctx: &ApplyContext,
        _name: &str,
        _olds: &PropertyMap,
        news: &PropertyMap,
    ) -> Result<CheckResponse> {
        let mut response = check_inputs::<RandomArgs>(Self::TYPE_NAME, &self.schema(), news);
        if let Some(PropertyValue::Number(length)) = news.get("length") {
            if *length < 0.0 {
                response.failures.push(CheckFailure::new(
                    "length",
                    format!("length must not be negative, got {length}"),
                ));
            } else if *length > MAX_LENGTH as f64 {
                response.failures.push(CheckFailure::new(
                    "length",
                    format!("length must be at most {MAX_LENGTH}, got {length}"),
                ));
            }
        }
        Ok(response)
    }

    fn create(
        &self,
        _ctx: &ApplyContext,
        name: &str,
        args: RandomArgs,
    ) -> Result<(String, RandomState)> {
        let length = match usize::try_from(args.length) {
            Ok(length) if args.length <= MAX_LENGTH => length,
            _ => {
                return Err(Error::provider(format!(
                    "{name}: invalid length {}",
                    args.length
                )));
            }
        };

        Ok((
            name.to_string(),
            RandomState {
                length: args.length,
                result: random_string(length),
            },
        ))
    }
}
