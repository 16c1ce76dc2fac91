//! Reports the weights its setup received.

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};

#[derive(Debug, Default)]
pub struct WeightsPredictor {
    weights: Option<Weights>,
}

pub fn info() -> PredictorInfo {
    PredictorInfo::new("weights", "Predictor", OutputType::single(PrimitiveType::String))
        .input(InputField::new("i", FieldType::required(PrimitiveType::Integer)))
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), WeightsPredictor::default())
}

impl Predictor for WeightsPredictor {
    fn setup_weights(&self) -> bool {
        true
    }

    fn setup(&mut self, weights: Option<Weights>) -> anyhow::Result<()> {
        tracing::info!(?weights, "Weights predictor setup");
        self.weights = weights;
        Ok(())
    }

    fn predict(&mut self, _args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let reported = match &self.weights {
            Some(Weights::Url(url)) => url.clone(),
            Some(Weights::Path(path)) => path.display().to_string(),
            None => String::new(),
        };
        Ok(PredictOutput::value(reported))
    }
}
