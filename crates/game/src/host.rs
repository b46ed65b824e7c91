//! Host glue: owns the stage, the shift sequencer, the camera and the live
//! agent's controller, and drives them from the three entry points.

use crate::camera::FollowCamera;
use crate::config::{ConfigError, GameConfig};
use crate::interfaces::{AgentFactory, AgentHandle, InputFrame, InputSource};
use crate::locomotion::LocomotionController;
use crate::shift::{Polarity, ShiftProgress, ShiftSequencer};
use crate::stage::Stage;

pub struct Game {
    config: GameConfig,
    stage: Stage,
    sequencer: ShiftSequencer,
    camera: FollowCamera,
    /// Controller of the live agent. Dropped with the agent on shift.
    controller: Option<LocomotionController>,
}

impl Game {
    /// Build the demo stage. Nothing is spawned until [`Game::on_init`].
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut stage = Stage::new(&config.stage);
        stage.build_demo_level();
        Ok(Self {
            sequencer: ShiftSequencer::new(config.shift.clone()),
            camera: FollowCamera::new(config.camera.clone()),
            stage,
            controller: None,
            config,
        })
    }

    pub fn on_init(&mut self) {
        if self.sequencer.current_agent().is_some() || self.sequencer.in_progress() {
            log::warn!("on_init called twice, ignored");
            return;
        }
        self.sequencer.on_init(&mut self.stage, &mut self.camera);
        self.controller = Some(LocomotionController::new(self.config.locomotion.clone()));
    }

    pub fn on_input_tick(&mut self, dt: f32, input: &dyn InputSource) {
        let frame = InputFrame::sample(input);

        if let ShiftProgress::Completed { .. } =
            self.sequencer.advance(&mut self.stage, &mut self.camera, dt)
        {
            self.controller = Some(LocomotionController::new(self.config.locomotion.clone()));
        }

        if frame.shift && self.sequencer.trigger(&mut self.stage) {
            self.controller = None;
        }

        if !self.sequencer.in_progress() {
            if let (Some(agent), Some(controller)) =
                (self.sequencer.current_agent(), self.controller.as_mut())
            {
                match self.stage.body_proxy(agent) {
                    Some(mut body) => {
                        controller.on_input_tick(&frame, Some(&self.stage), &mut body, dt);
                        self.stage.commit(&body);
                    }
                    None => log::warn!("agent {:?} has no body", agent),
                }
            }
        }

        let target = self
            .camera
            .target()
            .and_then(|agent| self.stage.agent_position(agent));
        self.camera.update(dt, target);
    }

    pub fn on_physics_tick(&mut self, dt: f32) {
        if !self.sequencer.in_progress() {
            if let (Some(agent), Some(controller)) =
                (self.sequencer.current_agent(), self.controller.as_mut())
            {
                if let Some(mut body) = self.stage.body_proxy(agent) {
                    controller.on_physics_tick(&mut body, dt);
                    self.stage.commit(&body);
                }
            }
        }
        self.stage.step(dt);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn sequencer(&self) -> &ShiftSequencer {
        &self.sequencer
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn controller(&self) -> Option<&LocomotionController> {
        self.controller.as_ref()
    }

    pub fn polarity(&self) -> Polarity {
        self.sequencer.polarity()
    }

    /// The live agent, if any.
    pub fn agent(&self) -> Option<AgentHandle> {
        self.sequencer.current_agent()
    }
}
